use eyre::Result;
use jobclock_client::api_client;
use jobclock_client::settings::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
    let res = api_client::health_check(&settings.server_address).await?;
    println!("Server:      {}", settings.server_address);
    println!("Environment: {}", res.environment);
    println!("Status:      {}", res.message);
    Ok(())
}
