use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use tally_domain::{
    Frequency, RecurrenceRule, RuleDraft, RuleRecord, Transaction, TransactionDraft,
    TransactionKind, UserId,
};

use crate::{
    materializer::{Checkpoint, Materializer},
    projection::{project, project_from},
    storage::PersistenceGateway,
    CoreError, DailyRun, InteractiveSync, MemoryGateway,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn gym_draft(frequency: Frequency, start: NaiveDate) -> RuleDraft {
    RuleDraft {
        amount: Decimal::from(50),
        description: "Gym membership".into(),
        category: "Health".into(),
        category_id: Some("cat-health".into()),
        kind: TransactionKind::Expense,
        frequency,
        start_date: start,
        active: true,
    }
}

fn stored_rule(gateway: &dyn PersistenceGateway, user: &UserId, id: Uuid) -> RecurrenceRule {
    gateway
        .list_rules(user)
        .unwrap()
        .into_iter()
        .filter_map(Result::ok)
        .find(|rule| rule.id == id)
        .expect("rule stored")
}

/// Memory store whose writes can be made to fail on demand.
#[derive(Default)]
struct FlakyGateway {
    inner: MemoryGateway,
    failing_dates: Mutex<HashSet<NaiveDate>>,
    fail_rule_updates: AtomicBool,
}

impl FlakyGateway {
    fn fail_creates_on(&self, date: NaiveDate) {
        self.failing_dates.lock().unwrap().insert(date);
    }

    fn heal(&self) {
        self.failing_dates.lock().unwrap().clear();
        self.fail_rule_updates.store(false, Ordering::SeqCst);
    }
}

impl PersistenceGateway for FlakyGateway {
    fn list_all_users(&self) -> Result<Vec<UserId>, CoreError> {
        self.inner.list_all_users()
    }

    fn list_rules(&self, user: &UserId) -> Result<Vec<RuleRecord>, CoreError> {
        self.inner.list_rules(user)
    }

    fn create_rule(&self, user: &UserId, draft: RuleDraft) -> Result<RecurrenceRule, CoreError> {
        self.inner.create_rule(user, draft)
    }

    fn update_rule(&self, user: &UserId, rule: &RecurrenceRule) -> Result<(), CoreError> {
        if self.fail_rule_updates.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("rule write timed out".into()));
        }
        self.inner.update_rule(user, rule)
    }

    fn delete_rule(&self, user: &UserId, id: Uuid) -> Result<bool, CoreError> {
        self.inner.delete_rule(user, id)
    }

    fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, CoreError> {
        self.inner.list_transactions(user)
    }

    fn create_transaction(
        &self,
        user: &UserId,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        if self.failing_dates.lock().unwrap().contains(&draft.date) {
            return Err(CoreError::Storage("network unreachable".into()));
        }
        self.inner.create_transaction(user, draft)
    }
}

#[test]
fn cursor_is_monotonic_and_beyond_every_due_date() {
    let start = date(2023, 12, 31);
    for frequency in Frequency::ALL {
        let mut cursor = start;
        let mut previous_cursor = start;
        for offset in 0..800 {
            let today = start + Duration::days(offset);
            let projection = project_from(cursor, frequency, today);
            assert!(projection.new_cursor >= previous_cursor);
            assert!(projection
                .due_dates
                .iter()
                .all(|due| *due < projection.new_cursor));
            previous_cursor = projection.new_cursor;
            cursor = projection.new_cursor;
        }
    }
}

#[test]
fn projection_has_no_gaps_and_no_extras() {
    let starts = [date(2024, 1, 31), date(2024, 2, 29), date(2023, 11, 30), date(2024, 6, 1)];
    for frequency in Frequency::ALL {
        for start in starts {
            for offset in [-1_i64, 0, 1, 6, 7, 30, 31, 365, 366, 1000] {
                let today = start + Duration::days(offset);
                let projection = project_from(start, frequency, today);
                if today < start {
                    assert!(projection.is_empty());
                    assert_eq!(projection.new_cursor, start);
                    continue;
                }
                assert_eq!(projection.due_dates.first(), Some(&start));
                for pair in projection.due_dates.windows(2) {
                    assert_eq!(frequency.checked_advance(pair[0]), Some(pair[1]));
                }
                let last = *projection.due_dates.last().unwrap();
                assert!(last <= today);
                assert_eq!(frequency.checked_advance(last), Some(projection.new_cursor));
                assert!(projection.new_cursor > today);
            }
        }
    }
}

#[test]
fn month_end_rule_drifts_after_clamping() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Monthly, date(2024, 1, 31)))
        .unwrap();

    let projection = project(&rule, date(2024, 4, 1));

    assert_eq!(
        projection.due_dates,
        vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]
    );
    assert_eq!(projection.new_cursor, date(2024, 4, 29));
}

#[test]
fn leap_day_yearly_rule_lands_on_feb_28() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Yearly, date(2024, 2, 29)))
        .unwrap();

    let projection = project(&rule, date(2025, 2, 27));

    assert_eq!(projection.due_dates, vec![date(2024, 2, 29)]);
    assert_eq!(projection.new_cursor, date(2025, 2, 28));
}

#[test]
fn daily_rule_catches_up_four_days() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();

    let outcome = Materializer::new(&gateway)
        .materialize(&user, &rule, date(2024, 6, 4))
        .unwrap();

    let dates: Vec<NaiveDate> = outcome.created.iter().map(|txn| txn.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 6, 1), date(2024, 6, 2), date(2024, 6, 3), date(2024, 6, 4)]
    );
    assert!(outcome
        .created
        .iter()
        .all(|txn| txn.description == "Gym membership (Recurring)"
            && txn.amount == Decimal::from(50)
            && txn.category_id.as_deref() == Some("cat-health")));
    assert_eq!(outcome.updated_rule.next_due_date, date(2024, 6, 5));
    assert_eq!(
        stored_rule(&gateway, &user, rule.id).next_due_date,
        date(2024, 6, 5)
    );
}

#[test]
fn existing_occurrence_is_skipped() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();
    gateway
        .create_transaction(&user, rule.occurrence_draft(date(2024, 6, 3)))
        .unwrap();

    let outcome = Materializer::new(&gateway)
        .materialize(&user, &rule, date(2024, 6, 4))
        .unwrap();

    let dates: Vec<NaiveDate> = outcome.created.iter().map(|txn| txn.date).collect();
    assert_eq!(dates, vec![date(2024, 6, 1), date(2024, 6, 2), date(2024, 6, 4)]);
    assert_eq!(outcome.skipped, vec![date(2024, 6, 3)]);
    assert_eq!(gateway.list_transactions(&user).unwrap().len(), 4);
}

#[test]
fn user_entered_transaction_with_same_text_is_not_a_duplicate() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();
    let mut manual = rule.occurrence_draft(date(2024, 6, 1));
    manual.description = "Gym membership".into();
    gateway.create_transaction(&user, manual).unwrap();

    let outcome = Materializer::new(&gateway)
        .materialize(&user, &rule, date(2024, 6, 1))
        .unwrap();

    assert_eq!(outcome.created.len(), 1);
}

#[test]
fn replaying_the_same_rule_snapshot_is_idempotent() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Weekly, date(2024, 5, 1)))
        .unwrap();
    let today = date(2024, 6, 4);
    let materializer = Materializer::new(&gateway);

    let first = materializer.materialize(&user, &rule, today).unwrap();
    // a stale copy of the rule, as another device would still hold it
    let second = materializer.materialize(&user, &rule, today).unwrap();

    assert_eq!(first.created.len(), 5);
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 5);
    assert_eq!(gateway.list_transactions(&user).unwrap().len(), 5);
    assert_eq!(second.updated_rule.next_due_date, first.updated_rule.next_due_date);
}

#[test]
fn interactive_and_unattended_runs_share_dedup() {
    let gateway = Arc::new(MemoryGateway::new());
    let user = UserId::from("alice");
    gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();
    let today = date(2024, 6, 4);

    // client loaded its rules before the server pass ran
    let mut client = InteractiveSync::new(gateway.clone(), user.clone());
    let cached = crate::storage::partition_records(gateway.list_rules(&user).unwrap()).0;

    let daily = DailyRun::new(gateway.clone()).run(today).unwrap();
    let interactive = client.observe(cached, today).expect("first observation runs");

    assert_eq!(daily.totals.transactions_created, 4);
    assert_eq!(interactive.totals.transactions_created, 0);
    assert_eq!(interactive.totals.occurrences_skipped, 4);
    assert_eq!(gateway.list_transactions(&user).unwrap().len(), 4);
}

#[test]
fn stale_interactive_run_never_moves_the_stored_cursor_back() {
    let gateway = Arc::new(MemoryGateway::new());
    let user = UserId::from("alice");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();

    // client cached the rule at its original cursor, then the server caught up through 06-05
    let mut client = InteractiveSync::new(gateway.clone(), user.clone());
    let cached = vec![rule.clone()];
    DailyRun::new(gateway.clone()).run(date(2024, 6, 5)).unwrap();
    assert_eq!(stored_rule(gateway.as_ref(), &user, rule.id).next_due_date, date(2024, 6, 6));

    // the client's clock still reads 06-04
    let report = client.observe(cached, date(2024, 6, 4)).expect("first observation runs");

    assert_eq!(report.totals.transactions_created, 0);
    assert_eq!(stored_rule(gateway.as_ref(), &user, rule.id).next_due_date, date(2024, 6, 6));
    assert_eq!(client.rules()[0].next_due_date, date(2024, 6, 6));
    assert_eq!(gateway.list_transactions(&user).unwrap().len(), 5);
}

#[test]
fn cursor_write_keeps_a_concurrent_edit() {
    let gateway = MemoryGateway::new();
    let user = UserId::from("alice");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();

    let mut edited = rule.clone();
    edited.amount = Decimal::from(65);
    gateway.update_rule(&user, &edited).unwrap();

    // materialize from the copy read before the edit
    let outcome = Materializer::new(&gateway)
        .with_checkpoint(Checkpoint::EndOfBatch)
        .materialize(&user, &rule, date(2024, 6, 2))
        .unwrap();

    let stored = stored_rule(&gateway, &user, rule.id);
    assert_eq!(stored.next_due_date, date(2024, 6, 3));
    assert_eq!(stored.amount, Decimal::from(65));
    assert_eq!(outcome.updated_rule.amount, Decimal::from(65));
}

#[test]
fn failed_create_holds_cursor_at_that_date() {
    for checkpoint in [Checkpoint::EndOfBatch, Checkpoint::PerOccurrence] {
        let gateway = FlakyGateway::default();
        let user = UserId::from("u");
        let rule = gateway
            .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
            .unwrap();
        gateway.fail_creates_on(date(2024, 6, 2));

        let outcome = Materializer::new(&gateway)
            .with_checkpoint(checkpoint)
            .materialize(&user, &rule, date(2024, 6, 4))
            .unwrap();

        assert_eq!(outcome.failed, vec![date(2024, 6, 2)]);
        assert_eq!(outcome.created.len(), 3, "later dates still attempted");
        assert_eq!(outcome.updated_rule.next_due_date, date(2024, 6, 2));
        assert_eq!(
            stored_rule(&gateway, &user, rule.id).next_due_date,
            date(2024, 6, 2)
        );

        gateway.heal();
        let retry = Materializer::new(&gateway)
            .with_checkpoint(checkpoint)
            .materialize(&user, &outcome.updated_rule, date(2024, 6, 4))
            .unwrap();

        assert_eq!(retry.created.len(), 1);
        assert_eq!(retry.skipped, vec![date(2024, 6, 3), date(2024, 6, 4)]);
        assert_eq!(retry.updated_rule.next_due_date, date(2024, 6, 5));
        assert_eq!(gateway.list_transactions(&user).unwrap().len(), 4);
    }
}

#[test]
fn failed_cursor_write_keeps_stored_cursor_and_next_run_dedups() {
    let gateway = FlakyGateway::default();
    let user = UserId::from("u");
    let rule = gateway
        .create_rule(&user, gym_draft(Frequency::Daily, date(2024, 6, 1)))
        .unwrap();
    gateway.fail_rule_updates.store(true, Ordering::SeqCst);

    let outcome = Materializer::new(&gateway)
        .materialize(&user, &rule, date(2024, 6, 2))
        .unwrap();

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.updated_rule.next_due_date, date(2024, 6, 1));

    gateway.heal();
    let retry = Materializer::new(&gateway)
        .materialize(&user, &outcome.updated_rule, date(2024, 6, 2))
        .unwrap();

    assert!(retry.created.is_empty());
    assert_eq!(retry.updated_rule.next_due_date, date(2024, 6, 3));
}
