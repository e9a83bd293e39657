use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;

use tally_config::{Config, ConfigManager};
use tally_core::{storage::PersistenceGateway, Clock, DailySchedule, SystemClock};
use tally_storage_json::JsonStore;

use crate::{errors::CliError, utils};

/// Loaded configuration plus the store every command works against.
pub struct AppContext {
    base_dir: PathBuf,
    config: Config,
    config_manager: ConfigManager,
    store: Arc<JsonStore>,
}

impl AppContext {
    /// Resolves the base directory from `TALLY_HOME` (default `~/.tally`).
    pub fn load() -> Result<Self, CliError> {
        Self::from_base_dir(utils::app_base_dir())
    }

    pub fn from_base_dir(base_dir: PathBuf) -> Result<Self, CliError> {
        let manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = manager.load()?.with_env_overrides();
        let store = JsonStore::new(config.resolve_data_dir(&base_dir))?;
        tracing::debug!(base = %base_dir.display(), data = %store.root().display(), "context loaded");
        Ok(Self {
            base_dir,
            config,
            config_manager: manager,
            store: Arc::new(store),
        })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Manager of the on-disk config file, without environment overrides applied.
    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn gateway(&self) -> Arc<dyn PersistenceGateway> {
        self.store.clone()
    }

    pub fn schedule(&self) -> Result<DailySchedule, CliError> {
        Ok(DailySchedule::new(
            self.config.schedule.run_at()?,
            self.config.schedule.utc_offset()?,
        ))
    }

    /// Clock reading calendar dates in the schedule's UTC offset.
    pub fn clock(&self) -> Result<SystemClock, CliError> {
        Ok(SystemClock::with_offset(self.config.schedule.utc_offset()?))
    }

    pub fn today(&self, requested: Option<NaiveDate>) -> Result<NaiveDate, CliError> {
        match requested {
            Some(date) => Ok(date),
            None => Ok(self.clock()?.today()),
        }
    }
}
