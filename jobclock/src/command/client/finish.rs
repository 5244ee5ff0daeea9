use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number; defaults to the only open timer
    pub job: Option<String>,
    /// Adjust the confirmed total in 10-minute steps, e.g. -2 or 3
    #[arg(long, short, default_value_t = 0, allow_hyphen_values = true)]
    pub adjust: i64,
    /// Comment stored on the finished entry
    #[arg(long, short)]
    pub comment: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let mut engine = super::engine(settings)?;
        engine.load().await?;

        let id = super::select_timer(engine.timers(), self.job.as_deref())?.id;
        let entry = engine.finish(id, self.adjust, self.comment).await?;

        println!(
            "Clocked out of {} at {}.",
            entry.job_no,
            format_duration(entry.total_seconds)
        );
        Ok(())
    }
}
