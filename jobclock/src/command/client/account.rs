use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;

mod login;
mod logout;
mod register;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub enum Cmd {
    /// Create a new account; an admin must verify it before login
    Register(register::Cmd),
    /// Log in and store the session locally
    Login(login::Cmd),
    /// End the session on the server and locally
    Logout,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        match self {
            Self::Register(cmd) => cmd.run(settings).await,
            Self::Login(cmd) => cmd.run(settings).await,
            Self::Logout => logout::run(settings).await,
        }
    }
}
