//! tally-domain
//!
//! Pure domain models (RecurrenceRule, Transaction, Frequency, etc.).
//! No I/O, no CLI, no storage. Only data types, calendar stepping and core enums.

pub mod common;
pub mod frequency;
pub mod rule;
pub mod transaction;

pub use common::*;
pub use frequency::*;
pub use rule::*;
pub use transaction::*;
