use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";
const STAGING_EXTENSION: &str = "json.partial";

/// Handles persistence for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self::new(base.join(CONFIG_FILE)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the stored config, falling back to defaults when no file exists yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.config_path)?;
        let config: Config =
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates `config` and replaces the file. The new contents are synced to a staging
    /// file first, so a crash leaves either the old file or the new one.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_vec_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = self.config_path.with_extension(STAGING_EXTENSION);
        let mut file = File::create(&staging)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&staging, &self.config_path)?;
        Ok(())
    }

    /// Loads the stored file (not the environment), applies `change` and saves the result.
    pub fn update(&self, change: impl FnOnce(&mut Config)) -> Result<Config, ConfigError> {
        let mut config = self.load()?;
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
