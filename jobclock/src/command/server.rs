use clap::Parser;
use eyre::Result;
use jobclock_server::database::Database;
use jobclock_server::settings::Settings;
use std::net::SocketAddr;
use tracing_subscriber::{self, fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub enum Cmd {
    /// Start the api server
    Start {
        /// Host address
        #[clap(long)]
        host: Option<String>,
        /// Port to bind
        #[clap(long, short)]
        port: Option<u16>,
    },
    /// Mark an account as verified so it can log in
    VerifyUser {
        /// Employee code of the account
        emp_code: String,
    },
    /// Reset the password of an account
    SetPassword {
        /// Employee code of the account
        emp_code: String,
    },
    /// Remove an account; its open sessions stop working immediately
    DeleteUser {
        /// Employee code of the account
        emp_code: String,
    },
}

impl Cmd {
    #[tokio::main]
    pub async fn run(self) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();

        tracing::trace!(command = ?self, "server command");

        match self {
            Self::Start { host, port } => {
                let mut settings = Settings::new()?;
                if let Some(host) = host {
                    settings.host = host;
                }
                if let Some(port) = port {
                    settings.port = port;
                }
                let address = SocketAddr::new(settings.host.parse()?, settings.port);
                jobclock_server::launch(settings, address).await
            }
            Self::VerifyUser { emp_code } => {
                let settings = Settings::new()?;
                let database = Database::new(&settings.db_path).await?;
                database.verify_user(&emp_code).await?;
                println!("Account {emp_code} is now verified.");
                Ok(())
            }
            Self::SetPassword { emp_code } => {
                let password = jobclock_client::utils::read_input_hidden("new password");
                let hash = jobclock_server::authentication::hash_password(&password)?;

                let settings = Settings::new()?;
                let database = Database::new(&settings.db_path).await?;
                database.update_password(&emp_code, &hash).await?;
                println!("Password updated for {emp_code}.");
                Ok(())
            }
            Self::DeleteUser { emp_code } => {
                let settings = Settings::new()?;
                let database = Database::new(&settings.db_path).await?;
                database.delete_user(&emp_code).await?;
                println!("Account {emp_code} removed.");
                Ok(())
            }
        }
    }
}
