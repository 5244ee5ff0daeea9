use clap::Parser;
use eyre::Result;
use jobclock_client::api_client;
use jobclock_client::settings::Settings;
use jobclock_client::utils::{read_input, read_input_hidden};

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    #[arg(long, short)]
    pub emp_code: Option<String>,
    #[arg(long, short)]
    pub password: Option<String>,
    /// Keep the session for 7 days instead of 24 hours
    #[arg(long, short)]
    pub remember: bool,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        if settings.session().is_some() {
            println!("You are already logged in.");
            return Ok(());
        }

        let emp_code = self.emp_code.unwrap_or_else(|| read_input("employee code"));
        let password = self
            .password
            .unwrap_or_else(|| read_input_hidden("password"));

        let res = api_client::login(
            &settings.server_address,
            &emp_code,
            &password,
            self.remember,
        )
        .await?;

        settings.save_session(&res.session)?;
        println!("Logged in as {}.", res.user.emp_code);
        Ok(())
    }
}
