//! Materializer: turns projected due dates into stored transactions and advances the cursor.
//!
//! The duplicate check is a read followed by a write with nothing held in between, so two
//! concurrent runs can still both create the same occurrence. What keeps repeated runs
//! idempotent is the generated-marker check, not locking. Every ordering used here creates
//! before it advances, so an interrupted or failing run can leave a duplicate behind for
//! [`crate::ReconcileService`] to flag, but never a lost occurrence.

use chrono::NaiveDate;

use tally_domain::{RecurrenceRule, Transaction, UserId};

use crate::{projection::project, storage::PersistenceGateway, CoreError, RuleService};

/// When the advanced cursor is written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Checkpoint {
    /// One cursor write after the whole batch. Used by the interactive adapter.
    #[default]
    EndOfBatch,
    /// A cursor write right after each occurrence is settled. Used by the unattended adapter.
    PerOccurrence,
}

/// Outcome of materializing one rule.
#[derive(Debug, Clone)]
pub struct Materialization {
    pub created: Vec<Transaction>,
    /// Dates already covered by an existing generated transaction.
    pub skipped: Vec<NaiveDate>,
    /// Dates abandoned because a store call failed; retried on the next run.
    pub failed: Vec<NaiveDate>,
    /// The rule as it now stands in the store.
    pub updated_rule: RecurrenceRule,
}

impl Materialization {
    fn unchanged(rule: RecurrenceRule) -> Self {
        Self {
            created: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            updated_rule: rule,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

enum Settled {
    Created(Transaction),
    AlreadyPresent,
}

/// Creates at most one transaction per (rule, due date) and moves the rule's cursor forward.
pub struct Materializer<'a> {
    gateway: &'a dyn PersistenceGateway,
    checkpoint: Checkpoint,
}

impl<'a> Materializer<'a> {
    pub fn new(gateway: &'a dyn PersistenceGateway) -> Self {
        Self {
            gateway,
            checkpoint: Checkpoint::default(),
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Materializes every occurrence of `rule` due on or before `today`.
    ///
    /// Store failures on individual dates are logged and do not abort the run; the cursor
    /// stops at the earliest failed date so that date is projected again next time.
    pub fn materialize(
        &self,
        user: &UserId,
        rule: &RecurrenceRule,
        today: NaiveDate,
    ) -> Result<Materialization, CoreError> {
        if !rule.active {
            return Err(CoreError::InactiveRule(rule.id));
        }
        let projection = project(rule, today);
        if projection.is_empty() {
            return Ok(Materialization::unchanged(rule.clone()));
        }

        let mut outcome = Materialization::unchanged(rule.clone());
        let mut first_failure: Option<NaiveDate> = None;

        for (idx, &date) in projection.due_dates.iter().enumerate() {
            match self.settle(user, rule, date) {
                Ok(Settled::Created(txn)) => outcome.created.push(txn),
                Ok(Settled::AlreadyPresent) => {
                    tracing::debug!(user = %user, rule = %rule.id, %date, "occurrence already materialized");
                    outcome.skipped.push(date);
                }
                Err(err) => {
                    tracing::warn!(user = %user, rule = %rule.id, %date, error = %err, "recurring occurrence abandoned");
                    outcome.failed.push(date);
                    first_failure.get_or_insert(date);
                    continue;
                }
            }
            if self.checkpoint == Checkpoint::PerOccurrence && first_failure.is_none() {
                let next = projection
                    .due_dates
                    .get(idx + 1)
                    .copied()
                    .unwrap_or(projection.new_cursor);
                self.advance(user, &mut outcome.updated_rule, next);
            }
        }

        if self.checkpoint == Checkpoint::EndOfBatch {
            let target = first_failure.unwrap_or(projection.new_cursor);
            self.advance(user, &mut outcome.updated_rule, target);
        }

        tracing::info!(
            user = %user,
            rule = %rule.id,
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            cursor = %outcome.updated_rule.next_due_date,
            "recurring rule materialized"
        );
        Ok(outcome)
    }

    fn settle(
        &self,
        user: &UserId,
        rule: &RecurrenceRule,
        date: NaiveDate,
    ) -> Result<Settled, CoreError> {
        let existing = self.gateway.list_transactions_on_date(user, date)?;
        if existing
            .iter()
            .any(|txn| txn.is_generated_from(&rule.description))
        {
            return Ok(Settled::AlreadyPresent);
        }
        let created = self
            .gateway
            .create_transaction(user, rule.occurrence_draft(date))?;
        tracing::info!(user = %user, rule = %rule.id, %date, transaction = %created.id, "created recurring transaction");
        Ok(Settled::Created(created))
    }

    /// Writes `target` as the cursor when it moves forward past the stored cursor.
    ///
    /// The cursor is applied to the stored document, not to the caller's copy, so a stale
    /// copy can neither move the cursor back nor undo a concurrent edit. `rule` ends up as the
    /// last state the store holds.
    fn advance(&self, user: &UserId, rule: &mut RecurrenceRule, target: NaiveDate) {
        if target <= rule.next_due_date {
            return;
        }
        let stored = match RuleService::find(self.gateway, user, rule.id) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(user = %user, rule = %rule.id, cursor = %target, error = %err, "failed to read recurring cursor");
                return;
            }
        };
        if stored.next_due_date >= target {
            tracing::debug!(user = %user, rule = %rule.id, stored = %stored.next_due_date, "stored cursor already ahead");
            *rule = stored;
            return;
        }
        let mut next = stored;
        next.next_due_date = target;
        match self.gateway.update_rule(user, &next) {
            Ok(()) => *rule = next,
            Err(err) => {
                tracing::warn!(user = %user, rule = %rule.id, cursor = %target, error = %err, "failed to advance recurring cursor");
            }
        }
    }
}
