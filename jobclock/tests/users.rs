mod helpers;
use helpers::{login_user, spawn_app};
use jobclock_client::api_client::{self, ApiClientError};
use jobclock_common::api::AddFavoriteRequest;

#[tokio::test]
async fn signup_login_validate() {
    let server = spawn_app().await.unwrap();

    let user = api_client::signup(&server.address, "E100", Some("Ada"), "hunter42")
        .await
        .unwrap();
    assert_eq!(user.emp_code, "E100");
    assert!(!user.verified);

    // an unverified account is refused with a distinct code
    let err = api_client::login(&server.address, "E100", "hunter42", false)
        .await
        .unwrap_err();
    match err {
        ApiClientError::Server { status, ref code, .. } => {
            assert_eq!(status, 403);
            assert_eq!(code.as_deref(), Some("USER_NOT_VERIFIED"));
        }
        other => panic!("expected server error, got {other:?}"),
    }

    server.database.verify_user("E100").await.unwrap();

    let res = api_client::login(&server.address, "E100", "hunter42", false)
        .await
        .unwrap();
    assert_eq!(res.user.emp_code, "E100");

    let client = api_client::AuthClient::new(&server.address, &res.session).unwrap();
    let me = client.validate().await.unwrap();
    assert_eq!(me.emp_code, "E100");
    assert!(me.verified);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_both_fail() {
    let server = spawn_app().await.unwrap();
    login_user(&server, "E100").await.unwrap();

    let err = api_client::login(&server.address, "E100", "not-it", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 401));

    let err = api_client::login(&server.address, "E999", "hunter42", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 401));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let server = spawn_app().await.unwrap();

    api_client::signup(&server.address, "E100", None, "hunter42")
        .await
        .unwrap();
    let err = api_client::signup(&server.address, "E100", None, "other")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 409));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    client.validate().await.unwrap();
    client.logout().await.unwrap();

    let err = client.validate().await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 401));
}

#[tokio::test]
async fn stale_session_for_a_deleted_account_is_cut_off() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    server.database.delete_user("E100").await.unwrap();

    let err = client.validate().await.unwrap_err();
    match err {
        ApiClientError::Server { status, ref code, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code.as_deref(), Some("USER_DELETED"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn favorites_upsert_by_job() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let favorites = client
        .add_favorite(&AddFavoriteRequest {
            job_no: "J100".into(),
            job_name: "Warehouse".into(),
            acc_no: None,
            acc_name: None,
        })
        .await
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert!(favorites[0].acc_no.is_none());

    // same job again refreshes the row instead of duplicating it
    let favorites = client
        .add_favorite(&AddFavoriteRequest {
            job_no: "J100".into(),
            job_name: "Warehouse".into(),
            acc_no: Some("40-100".into()),
            acc_name: Some("Framing".into()),
        })
        .await
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].acc_no.as_deref(), Some("40-100"));

    let favorites = client.favorites("E100").await.unwrap();
    assert_eq!(favorites.len(), 1);

    let favorites = client.remove_favorite("J100").await.unwrap();
    assert!(favorites.is_empty());
}

#[tokio::test]
async fn favorites_are_not_readable_across_accounts() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();
    login_user(&server, "E200").await.unwrap();

    let err = client.favorites("E200").await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));
}
