use clap::Parser;
use eyre::{bail, Result};
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;
use time::OffsetDateTime;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number; defaults to the running timer
    pub job: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let mut engine = super::engine(settings)?;
        engine.load().await?;

        let (id, job_no) = match self.job.as_deref() {
            Some(job) => {
                let timer = super::select_timer(engine.timers(), Some(job))?;
                (timer.id, timer.job_no.clone())
            }
            None => match engine.running() {
                Some(timer) => (timer.id, timer.job_no.clone()),
                None => bail!("No running timer."),
            },
        };

        engine.pause(id).await?;

        let now = OffsetDateTime::now_utc();
        let timer = super::select_timer(engine.timers(), Some(&job_no))?;
        println!(
            "Paused {job_no} at {}.",
            format_duration(timer.elapsed_seconds(now))
        );
        Ok(())
    }
}
