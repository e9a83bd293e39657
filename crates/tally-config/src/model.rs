use std::{env, path::PathBuf, time::Duration};

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable that overrides [`Config::admin_secret`].
pub const ADMIN_SECRET_ENV: &str = "TALLY_ADMIN_SECRET";

const RUN_AT_FORMAT: &str = "%H:%M";

/// Settings for the recurring engine, the daily scheduler and the manual trigger listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for the JSON store. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,

    /// Static bearer secret for the manual trigger. Unset means every request is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_secret: Option<String>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default = "Config::default_run_ceiling_secs")]
    pub run_ceiling_secs: u64,

    #[serde(default = "Config::default_listen_addr")]
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            admin_secret: None,
            schedule: ScheduleConfig::default(),
            run_ceiling_secs: Self::default_run_ceiling_secs(),
            listen_addr: Self::default_listen_addr(),
        }
    }
}

impl Config {
    pub fn default_run_ceiling_secs() -> u64 {
        540
    }

    pub fn default_listen_addr() -> String {
        "127.0.0.1:8787".into()
    }

    pub fn run_ceiling(&self) -> Duration {
        Duration::from_secs(self.run_ceiling_secs)
    }

    /// Replaces the admin secret with `TALLY_ADMIN_SECRET` when that variable is set.
    pub fn with_env_overrides(self) -> Self {
        let secret = env::var(ADMIN_SECRET_ENV).ok();
        self.with_admin_secret_override(secret)
    }

    pub fn with_admin_secret_override(mut self, secret: Option<String>) -> Self {
        if let Some(secret) = secret.filter(|value| !value.trim().is_empty()) {
            self.admin_secret = Some(secret);
        }
        self
    }

    pub fn resolve_data_dir(&self, base: &std::path::Path) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }
        base.join("data")
    }

    /// Default base directory when `TALLY_HOME` is not set.
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tally")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.run_at()?;
        self.schedule.utc_offset()?;
        if self.admin_secret.as_deref().is_some_and(|secret| secret.trim().is_empty()) {
            return Err(ConfigError::Invalid("admin_secret must not be blank".into()));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_addr must not be empty".into()));
        }
        Ok(())
    }
}

/// Wall-clock time and fixed UTC offset of the daily run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// `HH:MM`, 24-hour.
    #[serde(default = "ScheduleConfig::default_run_at")]
    pub run_at: String,
    #[serde(default = "ScheduleConfig::default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_at: Self::default_run_at(),
            utc_offset_minutes: Self::default_utc_offset_minutes(),
        }
    }
}

impl ScheduleConfig {
    pub fn default_run_at() -> String {
        "00:00".into()
    }

    /// UTC+05:30.
    pub fn default_utc_offset_minutes() -> i32 {
        330
    }

    pub fn run_at(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.run_at.trim(), RUN_AT_FORMAT).map_err(|_| {
            ConfigError::Invalid(format!(
                "schedule.run_at `{}` is not a HH:MM time",
                self.run_at
            ))
        })
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "schedule.utc_offset_minutes {} is out of range",
                    self.utc_offset_minutes
                ))
            })
    }
}
