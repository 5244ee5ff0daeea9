use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Filter jobs by number or name
    pub search: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let client = super::auth_client(settings)?;
        let jobs = client.jobs(self.search.as_deref()).await?;

        if jobs.is_empty() {
            println!("No jobs found.");
            return Ok(());
        }

        for job in jobs {
            println!(
                "{:<10} {:<10} {}",
                job.job_no,
                job.status.as_deref().unwrap_or(""),
                job.job_name
            );
        }
        Ok(())
    }
}
