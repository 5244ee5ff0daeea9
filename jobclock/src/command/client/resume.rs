use clap::Parser;
use eyre::{bail, Result};
use jobclock_client::settings::Settings;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Job number; defaults to the only paused timer
    pub job: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let mut engine = super::engine(settings)?;
        engine.load().await?;

        let id = match self.job.as_deref() {
            Some(job) => super::select_timer(engine.timers(), Some(job))?.id,
            None => {
                let paused: Vec<_> = engine.timers().iter().filter(|t| t.paused).collect();
                match paused.as_slice() {
                    [] => bail!("No paused timers."),
                    [timer] => timer.id,
                    _ => {
                        let jobs: Vec<&str> =
                            paused.iter().map(|t| t.job_no.as_str()).collect();
                        bail!(
                            "More than one paused timer ({}); pass the job number.",
                            jobs.join(", ")
                        )
                    }
                }
            }
        };

        engine.resume(id).await?;
        println!("Timer resumed.");
        Ok(())
    }
}
