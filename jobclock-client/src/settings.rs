use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File as ConfigFile, FileFormat};
use eyre::{eyre, Context, Result};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

const EXAMPLE_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub server_address: String,
    pub session_path: String,
    /// Fixed GPS coordinates reported by this client. Starting a timer
    /// fails when no location is configured.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl Settings {
    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let data_dir = jobclock_common::utils::data_dir();
        let session_path = data_dir.join("session");

        Ok(Config::builder()
            .set_default("server_address", "http://127.0.0.1:8090")?
            .set_default("session_path", session_path.to_str())?
            .add_source(
                Environment::with_prefix("jobclock")
                    .prefix_separator("_")
                    .separator("__"),
            ))
    }

    pub fn new() -> Result<Self> {
        let config_dir =
            std::env::var("JOBCLOCK_CONFIG_DIR").map_or(jobclock_common::utils::config_dir(), PathBuf::from);
        let data_dir = jobclock_common::utils::data_dir();

        create_dir_all(&config_dir)
            .wrap_err_with(|| format!("Failed to create dir {config_dir:?}"))?;
        create_dir_all(&data_dir).wrap_err_with(|| format!("Failed to create dir {data_dir:?}"))?;

        let mut config_builder = Self::builder()?;

        let config_file = config_dir.join("client.toml");
        if config_file.exists() {
            config_builder = config_builder.add_source(ConfigFile::new(
                config_file.to_str().unwrap(),
                FileFormat::Toml,
            ));
        } else {
            let mut file = File::create(config_file)?;
            file.write_all(EXAMPLE_CONFIG.as_bytes())?;
        }

        config_builder
            .build()?
            .try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize config {}", e))
    }

    pub fn session(&self) -> Option<String> {
        let path = PathBuf::from(&self.session_path);

        if !path.exists() {
            return None;
        }

        fs_err::read_to_string(path)
            .ok()
            .map(|v| v.trim().to_string())
    }

    pub fn save_session(&self, token: &str) -> Result<()> {
        let path = PathBuf::from(&self.session_path);
        if let Some(dir) = path.parent() {
            fs_err::create_dir_all(dir)?;
        }
        fs_err::write(path, token.as_bytes()).wrap_err("Failed to write session file")?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        let path = PathBuf::from(&self.session_path);
        if path.exists() {
            fs_err::remove_file(path)?;
        }
        Ok(())
    }
}
