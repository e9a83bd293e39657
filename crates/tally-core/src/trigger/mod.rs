//! Trigger adapters decide when and over which scope the materializer runs.
//!
//! Both adapters call the same [`crate::Materializer`]; neither carries projection logic.

pub mod interactive;
pub mod manual;
pub mod schedule;
pub mod unattended;

pub use interactive::InteractiveSync;
pub use manual::{ManualTrigger, TriggerResponse};
pub use schedule::DailySchedule;
pub use unattended::{DailyReport, DailyRun, DEFAULT_RUN_CEILING};

use serde::Serialize;

use crate::Materialization;

/// Counters accumulated over one adapter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTotals {
    pub rules_processed: usize,
    pub transactions_created: usize,
    pub occurrences_skipped: usize,
    pub occurrences_failed: usize,
    pub malformed_rules: usize,
}

impl RunTotals {
    pub(crate) fn record(&mut self, outcome: &Materialization) {
        self.rules_processed += 1;
        self.transactions_created += outcome.created.len();
        self.occurrences_skipped += outcome.skipped.len();
        self.occurrences_failed += outcome.failed.len();
    }
}
