//! tally-config
//!
//! Runtime configuration for the recurring engine and its server binary.
//! Owns the Config data structure plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, ScheduleConfig, ADMIN_SECRET_ENV};
