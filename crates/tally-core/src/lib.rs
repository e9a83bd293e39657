//! tally-core
//!
//! Recurring-transaction projection, materialization, and the trigger adapters that drive them.
//! Depends on tally-domain. No CLI, no terminal I/O, no direct filesystem access.

pub mod error;
pub mod materializer;
pub mod memory;
pub mod projection;
pub mod reconcile_service;
pub mod rule_service;
pub mod storage;
pub mod time;
pub mod trigger;
pub mod upcoming_service;

#[cfg(test)]
mod tests;

pub use error::CoreError;
pub use materializer::*;
pub use memory::MemoryGateway;
pub use projection::*;
pub use reconcile_service::*;
pub use rule_service::*;
pub use storage::PersistenceGateway;
pub use time::{Clock, FixedClock, SystemClock};
pub use trigger::*;
pub use upcoming_service::*;
