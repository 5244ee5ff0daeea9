use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;
use jobclock_client::utils::format_duration;
use time::format_description::well_known::Rfc3339;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Maximum number of entries to show
    #[arg(long, short, default_value_t = 20)]
    pub limit: i64,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let client = super::auth_client(settings)?;
        let entries = client.entries(self.limit).await?;

        if entries.is_empty() {
            println!("No entries yet.");
            return Ok(());
        }

        for entry in entries {
            let started = entry.start_time.format(&Rfc3339)?;
            println!(
                "{:<10} {:<10} {}  {}  {}",
                entry.job_no,
                entry.status.as_str(),
                format_duration(entry.total_seconds),
                started,
                entry.comment.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }
}
