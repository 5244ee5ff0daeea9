use eyre::Result;
use jobclock_client::api_client::AuthClient;
use jobclock_client::settings::Settings;
use tracing::warn;

pub async fn run(settings: &Settings) -> Result<()> {
    let Some(session) = settings.session() else {
        println!("You are not logged in.");
        return Ok(());
    };

    // local session file goes away even when the server is unreachable
    let client = AuthClient::new(&settings.server_address, &session)?;
    if let Err(err) = client.logout().await {
        warn!("could not end the session on the server: {err}");
    }

    settings.clear_session()?;
    println!("Logged out.");
    Ok(())
}
