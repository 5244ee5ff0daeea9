use axum::serve;
use eyre::{eyre, Result};
use jobclock_client::api_client::{self, AuthClient};
use jobclock_server::database::Database;
use jobclock_server::router::{self, AppState};
use jobclock_server::settings::Settings;
use tokio::net::TcpListener;

pub struct TestServer {
    pub address: String,
    pub database: Database,
}

pub async fn spawn_app() -> Result<TestServer> {
    // unroutable spire address; erp tests pass a wiremock url instead
    spawn_app_with_spire("http://127.0.0.1:1").await
}

pub async fn spawn_app_with_spire(spire_address: &str) -> Result<TestServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let settings: Settings = Settings::builder()?
        .set_default("db_path", "sqlite::memory:")?
        .set_default("port", port)?
        .set_default("spire_address", spire_address)?
        .set_default("spire_user", "spire")?
        .set_default("spire_password", "spire")?
        .set_default("spire_timeout_secs", 5)?
        .build()?
        .try_deserialize()
        .map_err(|e| eyre!("Failed to deserialize {e}"))?;

    let database = Database::new(&settings.db_path).await?;
    let state = AppState::new(settings, database.clone())?;
    let r = router::router(state);
    let _ = tokio::spawn(async move { serve(listener, r.into_make_service()).await.unwrap() });

    Ok(TestServer {
        address: format!("http://127.0.0.1:{port}"),
        database,
    })
}

/// Sign up, verify through the database and log in, returning an
/// authenticated client for the account.
pub async fn login_user(server: &TestServer, emp_code: &str) -> Result<AuthClient> {
    api_client::signup(&server.address, emp_code, Some("Test User"), "hunter42").await?;
    server.database.verify_user(emp_code).await?;

    let res = api_client::login(&server.address, emp_code, "hunter42", false).await?;
    AuthClient::new(&server.address, &res.session)
}
