use clap::Parser;
use eyre::Result;
use jobclock_client::settings::Settings;
use jobclock_common::api::AddFavoriteRequest;

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub enum Cmd {
    /// List favorite jobs
    List,
    /// Add or refresh a favorite
    Add {
        /// Job number
        job: String,
        /// Job name
        #[arg(long, short)]
        name: Option<String>,
        /// Costing account number
        #[arg(long, short)]
        account: Option<String>,
        /// Costing account name
        #[arg(long)]
        account_name: Option<String>,
    },
    /// Remove a favorite
    Remove {
        /// Job number
        job: String,
    },
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let client = super::auth_client(settings)?;

        let favorites = match self {
            Self::List => {
                let user = client.validate().await?;
                client.favorites(&user.emp_code).await?
            }
            Self::Add {
                job,
                name,
                account,
                account_name,
            } => {
                client
                    .add_favorite(&AddFavoriteRequest {
                        job_no: job.clone(),
                        job_name: name.unwrap_or_else(|| job.clone()),
                        acc_no: account,
                        acc_name: account_name,
                    })
                    .await?
            }
            Self::Remove { job } => client.remove_favorite(&job).await?,
        };

        if favorites.is_empty() {
            println!("No favorites.");
            return Ok(());
        }
        for favorite in favorites {
            let account = favorite.acc_no.as_deref().unwrap_or("");
            println!(
                "{:<10} {:<12} {}",
                favorite.job_no, account, favorite.job_name
            );
        }
        Ok(())
    }
}
