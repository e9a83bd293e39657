#![doc(test(attr(deny(warnings))))]

//! Tally keeps recurring income, expenses and investments materialized as dated transactions.
//!
//! The engine lives in the workspace crates; this crate wires them into the `tally` binary:
//! configuration, the JSON store, the daily scheduler and the manual trigger listener.

pub mod cli;
pub mod errors;
pub mod server;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Tally tracing initialized.");
    });
}
