//! Server-side adapter: one pass over every user, once per calendar day.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use serde::Serialize;

use tally_domain::UserId;

use crate::{
    materializer::{Checkpoint, Materializer},
    storage::{partition_records, PersistenceGateway},
    trigger::RunTotals,
    CoreError,
};

/// Wall-clock budget of a single daily pass.
pub const DEFAULT_RUN_CEILING: Duration = Duration::from_secs(540);

/// Summary of a daily pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub today: NaiveDate,
    pub users_processed: usize,
    pub users_failed: usize,
    /// Users not reached before the ceiling; the next pass picks them up.
    pub users_deferred: Vec<UserId>,
    #[serde(flatten)]
    pub totals: RunTotals,
    pub elapsed_ms: u64,
}

/// Materializes every active rule of every user, sequentially, within a time ceiling.
///
/// Each user's cursors are consistent on their own, so stopping between users is safe.
pub struct DailyRun {
    gateway: Arc<dyn PersistenceGateway>,
    ceiling: Duration,
}

impl DailyRun {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            ceiling: DEFAULT_RUN_CEILING,
        }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Runs the pass for `today`. Fails only when the user listing itself cannot be read.
    pub fn run(&self, today: NaiveDate) -> Result<DailyReport, CoreError> {
        let started = Instant::now();
        let users = self.gateway.list_all_users()?;
        tracing::info!(%today, users = users.len(), "processing recurring transactions");

        let mut report = DailyReport {
            today,
            users_processed: 0,
            users_failed: 0,
            users_deferred: Vec::new(),
            totals: RunTotals::default(),
            elapsed_ms: 0,
        };

        for (idx, user) in users.iter().enumerate() {
            if started.elapsed() >= self.ceiling {
                report.users_deferred = users[idx..].to_vec();
                tracing::warn!(
                    deferred = report.users_deferred.len(),
                    "daily recurring pass hit its time ceiling"
                );
                break;
            }
            match self.run_user(user, today, &mut report.totals) {
                Ok(()) => report.users_processed += 1,
                Err(err) => {
                    report.users_failed += 1;
                    tracing::warn!(user = %user, error = %err, "could not load recurring rules");
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            processed = report.totals.rules_processed,
            created = report.totals.transactions_created,
            skipped = report.totals.occurrences_skipped,
            failed = report.totals.occurrences_failed,
            "daily recurring pass finished"
        );
        Ok(report)
    }

    fn run_user(
        &self,
        user: &UserId,
        today: NaiveDate,
        totals: &mut RunTotals,
    ) -> Result<(), CoreError> {
        let (rules, malformed) = partition_records(self.gateway.list_active_rules(user)?);
        for bad in &malformed {
            tracing::warn!(user = %user, error = %bad, "skipping malformed recurring rule");
        }
        totals.malformed_rules += malformed.len();

        let materializer =
            Materializer::new(self.gateway.as_ref()).with_checkpoint(Checkpoint::PerOccurrence);
        for rule in rules.iter().filter(|rule| rule.active) {
            match materializer.materialize(user, rule, today) {
                Ok(outcome) => totals.record(&outcome),
                Err(err) => {
                    tracing::warn!(user = %user, rule = %rule.id, error = %err, "recurring rule skipped")
                }
            }
        }
        Ok(())
    }
}
