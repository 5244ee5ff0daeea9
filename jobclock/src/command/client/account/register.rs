use clap::Parser;
use eyre::Result;
use jobclock_client::api_client;
use jobclock_client::settings::Settings;
use jobclock_client::utils::{read_input, read_input_hidden};

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub struct Cmd {
    /// Employee code, as known to the ERP
    #[arg(long, short)]
    pub emp_code: Option<String>,
    /// Display name
    #[arg(long, short)]
    pub name: Option<String>,
    #[arg(long, short)]
    pub password: Option<String>,
}

impl Cmd {
    pub async fn run(self, settings: &Settings) -> Result<()> {
        let emp_code = self.emp_code.unwrap_or_else(|| read_input("employee code"));
        let name = self.name.unwrap_or_else(|| read_input("name"));
        let password = self
            .password
            .unwrap_or_else(|| read_input_hidden("password"));

        let name = (!name.is_empty()).then_some(name);
        let user = api_client::signup(
            &settings.server_address,
            &emp_code,
            name.as_deref(),
            &password,
        )
        .await?;

        println!("Account {} created.", user.emp_code);
        println!("An administrator must verify it before you can log in.");
        Ok(())
    }
}
