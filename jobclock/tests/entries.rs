mod helpers;
use helpers::{login_user, spawn_app};
use jobclock_client::api_client::ApiClientError;
use jobclock_common::api::{AddEntryRequest, StopEntryRequest, UpdateEntryRequest};
use jobclock_common::domain::{EntryStatus, GeoFix};
use time::OffsetDateTime;

fn start_request(job_no: &str) -> AddEntryRequest {
    AddEntryRequest {
        job_no: job_no.into(),
        job_name: format!("Job {job_no}"),
        start_location: vec![GeoFix::new(49.2827, -123.1207, 12.0)],
        ..Default::default()
    }
}

#[tokio::test]
async fn one_active_timer_per_job_and_employee() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    client.create_entry(&start_request("J100")).await.unwrap();

    let err = client.create_entry(&start_request("J100")).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 409));

    // a different job is an independent timer
    client.create_entry(&start_request("J200")).await.unwrap();

    // and another employee can clock in on the same job
    let other = login_user(&server, "E200").await.unwrap();
    other.create_entry(&start_request("J100")).await.unwrap();

    let active = client.active_entries().await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn pause_frees_the_job_for_a_new_start() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let id = client.create_entry(&start_request("J100")).await.unwrap();
    let entry = client
        .update_entry(
            id,
            &UpdateEntryRequest {
                status: Some("paused".into()),
                total_seconds: Some(60),
                start_time: Some(OffsetDateTime::now_utc()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.status, EntryStatus::Paused);
    assert_eq!(entry.total_seconds, 60);

    client.create_entry(&start_request("J100")).await.unwrap();
}

#[tokio::test]
async fn stop_is_terminal() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let id = client.create_entry(&start_request("J100")).await.unwrap();
    let entry = client
        .stop_entry(
            id,
            &StopEntryRequest {
                total_seconds: Some(4800),
                comment: Some("forms stripped".into()),
                end_location: Some(vec![GeoFix::new(49.2827, -123.1207, 9.0)]),
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.status, EntryStatus::Completed);
    assert_eq!(entry.total_seconds, 4800);
    assert!(entry.end_time.is_some());
    assert_eq!(entry.comment.as_deref(), Some("forms stripped"));

    let err = client
        .stop_entry(id, &StopEntryRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));
}

#[tokio::test]
async fn completed_backfill_skips_the_active_check() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    client.create_entry(&start_request("J100")).await.unwrap();

    let backfill = AddEntryRequest {
        status: Some("completed".into()),
        total_seconds: Some(3600),
        ..start_request("J100")
    };
    let id = client.create_entry(&backfill).await.unwrap();

    let entry = client.entry(id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Completed);
    assert!(entry.end_time.is_some());
}

#[tokio::test]
async fn entries_are_scoped_to_their_owner() {
    let server = spawn_app().await.unwrap();
    let owner = login_user(&server, "E100").await.unwrap();
    let intruder = login_user(&server, "E200").await.unwrap();

    let id = owner.create_entry(&start_request("J100")).await.unwrap();

    let err = intruder.entry(id).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));

    let err = intruder
        .update_entry(
            id,
            &UpdateEntryRequest {
                comment: Some("mine now".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));

    let err = intruder.delete_entry(id).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));

    assert!(intruder.entries(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_with_no_fields_is_rejected() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let id = client.create_entry(&start_request("J100")).await.unwrap();
    let err = client
        .update_entry(id, &UpdateEntryRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 400));
}

#[tokio::test]
async fn delete_returns_the_removed_entry() {
    let server = spawn_app().await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let id = client.create_entry(&start_request("J100")).await.unwrap();
    let removed = client.delete_entry(id).await.unwrap();
    assert_eq!(removed.job_no, "J100");

    let err = client.entry(id).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Server { status, .. } if status == 404));
}
