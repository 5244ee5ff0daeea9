use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number to clock in on
    pub job: String,
    /// Job name; looked up from the job list when omitted
    #[arg(long, short)]
    pub name: Option<String>,
    /// Costing account number
    #[arg(long, short)]
    pub account: Option<String>,
    /// Costing account name
    #[arg(long)]
    pub account_name: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let mut engine = super::engine(settings)?;
        engine.load().await?;

        let name = match self.name {
            Some(name) => name,
            None => {
                let client = super::auth_client(settings)?;
                client
                    .jobs(Some(&self.job))
                    .await?
                    .into_iter()
                    .find(|j| j.job_no == self.job)
                    .map(|j| j.job_name)
                    .unwrap_or_else(|| self.job.clone())
            }
        };

        engine
            .start(
                &self.job,
                &name,
                self.account.as_deref(),
                self.account_name.as_deref(),
            )
            .await?;

        println!("Clocked in on {} ({name}).", self.job);
        Ok(())
    }
}
