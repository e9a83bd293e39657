//! Client-side adapter: runs for the signed-in user whenever their active rules change.

use std::sync::Arc;

use chrono::NaiveDate;

use tally_domain::{RecurrenceRule, Transaction, UserId};

use crate::{
    materializer::{Checkpoint, Materializer},
    storage::{partition_records, PersistenceGateway},
    trigger::RunTotals,
    CoreError,
};

/// Result of one interactive pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub created: Vec<Transaction>,
    pub totals: RunTotals,
}

/// Holds the signed-in user's rules as the client sees them and materializes on change.
///
/// How changes are observed (snapshot listener, polling, an event bus) is up to the host;
/// it only has to hand every new rule set to [`InteractiveSync::observe`].
pub struct InteractiveSync {
    gateway: Arc<dyn PersistenceGateway>,
    user: UserId,
    rules: Vec<RecurrenceRule>,
    processed: Option<Vec<RecurrenceRule>>,
}

impl InteractiveSync {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, user: UserId) -> Self {
        Self {
            gateway,
            user,
            rules: Vec::new(),
            processed: None,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Locally cached rules, cursors included.
    pub fn rules(&self) -> &[RecurrenceRule] {
        &self.rules
    }

    /// Session load: reads the user's rules once and processes them.
    pub fn load(&mut self, today: NaiveDate) -> Result<Option<SyncReport>, CoreError> {
        let (rules, malformed) = partition_records(self.gateway.list_rules(&self.user)?);
        for bad in &malformed {
            tracing::warn!(user = %self.user, error = %bad, "skipping malformed recurring rule");
        }
        let mut report = self.observe(rules, today);
        if let Some(report) = report.as_mut() {
            report.totals.malformed_rules = malformed.len();
        }
        Ok(report)
    }

    /// Accepts the latest rule set. Materializes only when the active rules differ from the
    /// set produced by the previous pass, so the echo of our own cursor writes is a no-op.
    pub fn observe(&mut self, rules: Vec<RecurrenceRule>, today: NaiveDate) -> Option<SyncReport> {
        self.rules = rules;
        let active = active_snapshot(&self.rules);
        if self.processed.as_ref() == Some(&active) {
            return None;
        }
        Some(self.run(today))
    }

    /// Materializes every active local rule, one after another.
    pub fn run(&mut self, today: NaiveDate) -> SyncReport {
        let materializer =
            Materializer::new(self.gateway.as_ref()).with_checkpoint(Checkpoint::EndOfBatch);
        let mut report = SyncReport::default();

        for slot in self.rules.iter_mut().filter(|rule| rule.active) {
            match materializer.materialize(&self.user, slot, today) {
                Ok(outcome) => {
                    report.totals.record(&outcome);
                    report.created.extend(outcome.created);
                    *slot = outcome.updated_rule;
                }
                Err(err) => {
                    tracing::warn!(user = %self.user, rule = %slot.id, error = %err, "recurring rule skipped");
                }
            }
        }

        self.processed = Some(active_snapshot(&self.rules));
        if report.totals.transactions_created > 0 {
            tracing::info!(
                user = %self.user,
                created = report.totals.transactions_created,
                "interactive recurring sync complete"
            );
        }
        report
    }
}

fn active_snapshot(rules: &[RecurrenceRule]) -> Vec<RecurrenceRule> {
    let mut active: Vec<RecurrenceRule> = rules.iter().filter(|rule| rule.active).cloned().collect();
    active.sort_by_key(|rule| rule.id);
    active
}
