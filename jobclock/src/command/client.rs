use clap::Parser;
use eyre::{bail, Result};
use jobclock_client::api_client::AuthClient;
use jobclock_client::engine::{TimerEngine, TimerState};
use jobclock_client::location::ConfiguredLocation;
use jobclock_client::settings::Settings;

mod account;
mod accounts;
mod add;
mod favorites;
mod finish;
mod info;
mod jobs;
mod list;
mod pause;
mod resume;
mod start;
mod status;
mod watch;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub enum Cmd {
    /// Start a timer for a job
    Start(start::Cmd),
    /// Pause the running timer
    Pause(pause::Cmd),
    /// Resume a paused timer
    Resume(resume::Cmd),
    /// Stop a timer and confirm its final duration
    Finish(finish::Cmd),
    /// Record a completed entry directly
    Add(add::Cmd),
    /// Show open timers
    Status,
    /// List recent entries
    List(list::Cmd),
    /// Follow open timers, pushing elapsed time to the server
    Watch,
    /// Search jobs
    Jobs(jobs::Cmd),
    /// List costing accounts for a job
    Accounts(accounts::Cmd),
    /// Manage favorite jobs
    #[command(subcommand)]
    Favorites(favorites::Cmd),
    /// Account registration and sessions
    #[command(subcommand)]
    Account(account::Cmd),
    /// Server health and connection info
    Info,
}

impl Cmd {
    #[tokio::main]
    pub async fn run(self) -> Result<()> {
        let settings = Settings::new()?;

        match self {
            Self::Start(cmd) => cmd.run(&settings).await,
            Self::Pause(cmd) => cmd.run(&settings).await,
            Self::Resume(cmd) => cmd.run(&settings).await,
            Self::Finish(cmd) => cmd.run(&settings).await,
            Self::Add(cmd) => cmd.run(&settings).await,
            Self::Status => status::run(&settings).await,
            Self::List(cmd) => cmd.run(&settings).await,
            Self::Watch => watch::run(&settings).await,
            Self::Jobs(cmd) => cmd.run(&settings).await,
            Self::Accounts(cmd) => cmd.run(&settings).await,
            Self::Favorites(cmd) => cmd.run(&settings).await,
            Self::Account(cmd) => cmd.run(&settings).await,
            Self::Info => info::run(&settings).await,
        }
    }
}

pub(crate) fn auth_client(settings: &Settings) -> Result<AuthClient> {
    let Some(session) = settings.session() else {
        bail!("You are not logged in. Run `jobclock account login` first.");
    };
    AuthClient::new(&settings.server_address, &session)
}

pub(crate) fn engine(settings: &Settings) -> Result<TimerEngine> {
    let client = auth_client(settings)?;
    let location = Box::new(ConfiguredLocation::from_settings(settings));
    Ok(TimerEngine::new(client, location))
}

/// Pick an open timer by job number, or the only open one when no job
/// is given.
pub(crate) fn select_timer<'a>(
    timers: &'a [TimerState],
    job: Option<&str>,
) -> Result<&'a TimerState> {
    match job {
        Some(job) => timers
            .iter()
            .find(|t| t.job_no == job)
            .ok_or_else(|| eyre::eyre!("No open timer for job {job}")),
        None => match timers {
            [] => bail!("No open timers."),
            [timer] => Ok(timer),
            _ => {
                let jobs: Vec<&str> = timers.iter().map(|t| t.job_no.as_str()).collect();
                bail!(
                    "More than one open timer ({}); pass the job number.",
                    jobs.join(", ")
                )
            }
        },
    }
}
