use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number
    pub job: String,
    /// Job name
    #[arg(long, short)]
    pub name: Option<String>,
    /// Hours worked
    #[arg(long, default_value_t = 0)]
    pub hours: i64,
    /// Minutes worked
    #[arg(long, default_value_t = 0)]
    pub minutes: i64,
    /// Costing account number
    #[arg(long, short)]
    pub account: Option<String>,
    /// Costing account name
    #[arg(long)]
    pub account_name: Option<String>,
    /// Comment stored on the entry
    #[arg(long, short)]
    pub comment: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let mut engine = super::engine(settings)?;

        let name = self.name.unwrap_or_else(|| self.job.clone());
        engine
            .add_manual(
                &self.job,
                &name,
                self.account.as_deref(),
                self.account_name.as_deref(),
                self.hours,
                self.minutes,
                self.comment,
            )
            .await?;

        println!(
            "Recorded {} on {}.",
            format_duration(self.hours * 3600 + self.minutes * 60),
            self.job
        );
        Ok(())
    }
}
