use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File as ConfigFile, FileFormat};
use eyre::{eyre, Error, Result};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

const EXAMPLE_CONFIG: &str = include_str!("../server.toml");

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub environment: String,
    /// Policy for the auth gate when the user re-check hits a database
    /// failure: true lets the request through on the session identity.
    pub auth_fail_open: bool,
    pub spire_address: String,
    pub spire_user: String,
    pub spire_password: String,
    pub spire_timeout_secs: u64,
    pub spire_page_size: i64,
}

impl Settings {
    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let data_dir = jobclock_common::utils::data_dir();
        let db_path = data_dir.join("server.db");

        Ok(Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8090)?
            .set_default("db_path", db_path.to_str())?
            .set_default("environment", "development")?
            .set_default("auth_fail_open", true)?
            .set_default("spire_address", "http://localhost:10880/api/v2")?
            .set_default("spire_user", "")?
            .set_default("spire_password", "")?
            .set_default("spire_timeout_secs", 35)?
            .set_default("spire_page_size", 50)?
            .add_source(
                Environment::with_prefix("jobclock")
                    .prefix_separator("_")
                    .separator("__"),
            ))
    }

    pub fn new() -> Result<Self, Error> {
        let config_dir =
            std::env::var("JOBCLOCK_CONFIG_DIR").map_or(jobclock_common::utils::config_dir(), PathBuf::from);

        let mut config_builder = Self::builder()?;

        let config_file = config_dir.join("server.toml");

        if config_file.exists() {
            config_builder = config_builder.add_source(ConfigFile::new(
                config_file.to_str().unwrap(),
                FileFormat::Toml,
            ));
        } else {
            create_dir_all(config_file.parent().unwrap())?;
            let mut file = File::create(config_file)?;
            file.write_all(EXAMPLE_CONFIG.as_bytes())?;
        };

        let settings = config_builder
            .build()?
            .try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize config {}", e))?;

        Ok(settings)
    }
}
