mod helpers;
use helpers::spawn_app;

#[tokio::test]
async fn health_check() {
    let server = spawn_app().await.unwrap();

    let response = jobclock_client::api_client::health_check(&server.address)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.message, "Server is healthy");
    assert_eq!(response.environment, "development");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let server = spawn_app().await.unwrap();

    let res = reqwest::Client::new()
        .get(format!("{}/api/time-entries", server.address))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], serde_json::json!(false));
    assert_eq!(body["code"], serde_json::json!("MISSING_TOKEN"));
}
