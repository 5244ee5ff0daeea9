use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number to list costing accounts for
    pub job: String,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let client = super::auth_client(settings)?;
        let accounts = client.job_accounts(&self.job).await?;

        if accounts.is_empty() {
            println!("No costing accounts for {}.", self.job);
            return Ok(());
        }

        for account in accounts {
            println!("{:<12} {}", account.account_no, account.account_name);
        }
        Ok(())
    }
}
