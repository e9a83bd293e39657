use std::fs;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{storage::PersistenceGateway, DailyRun, Materializer};
use tally_domain::{Frequency, RuleDraft, TransactionKind, UserId};
use tally_storage_json::JsonStore;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rent() -> RuleDraft {
    RuleDraft {
        amount: Decimal::new(120050, 2),
        description: "Rent".into(),
        category: "Housing".into(),
        category_id: Some("housing".into()),
        kind: TransactionKind::Expense,
        frequency: Frequency::Monthly,
        start_date: date(2024, 1, 31),
        active: true,
    }
}

#[test]
fn rules_survive_a_reopen() {
    let dir = tempdir().expect("tempdir");
    let user = UserId::from("alice");
    let created = {
        let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
        store.create_rule(&user, rent()).expect("create rule")
    };

    let reopened = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let rules = reopened.list_rules(&user).expect("list rules");

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].as_ref().unwrap(), &created);
    assert_eq!(reopened.list_all_users().unwrap(), vec![user.clone()]);
    assert!(dir.path().join("users/alice/rules.json").exists());
    assert!(!dir.path().join("users/alice/rules.json.tmp").exists());
}

#[test]
fn materializing_writes_transactions_and_cursor() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let user = UserId::from("alice");
    let rule = store.create_rule(&user, rent()).expect("create rule");

    let outcome = Materializer::new(&store)
        .materialize(&user, &rule, date(2024, 4, 1))
        .expect("materialize");

    assert_eq!(outcome.created.len(), 3);
    let stored = store.list_transactions(&user).expect("list transactions");
    let dates: Vec<NaiveDate> = stored.iter().map(|txn| txn.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]);
    assert!(stored.iter().all(|txn| txn.description == "Rent (Recurring)"));
    assert_eq!(
        store.list_transactions_on_date(&user, date(2024, 2, 29)).unwrap().len(),
        1
    );
    let cursor = store.list_rules(&user).unwrap()[0].as_ref().unwrap().next_due_date;
    assert_eq!(cursor, date(2024, 4, 29));
}

#[test]
fn malformed_document_is_reported_and_left_untouched() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let user = UserId::from("bob");
    store.register_user(&user).expect("register");
    let broken = r#"[{ "id": "legacy-1", "description": "Old plan", "frequency": "fortnightly" }]"#;
    fs::write(dir.path().join("users/bob/rules.json"), broken).expect("seed");

    let rule = store.create_rule(&user, rent()).expect("create rule");
    let report = DailyRun::new(std::sync::Arc::new(store.clone()))
        .run(date(2024, 2, 1))
        .expect("daily run");

    assert_eq!(report.totals.malformed_rules, 1);
    assert_eq!(report.totals.transactions_created, 1);

    let raw = fs::read_to_string(dir.path().join("users/bob/rules.json")).expect("read");
    let documents: Vec<serde_json::Value> = serde_json::from_str(&raw).expect("json");
    assert_eq!(documents[0]["frequency"], "fortnightly");
    assert_eq!(documents[1]["id"], rule.id.to_string());
    assert_eq!(documents[1]["nextDueDate"], "2024-02-29");
}

#[test]
fn delete_and_update_missing_rules() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let user = UserId::from("carol");
    let rule = store.create_rule(&user, rent()).expect("create rule");

    assert!(store.delete_rule(&user, rule.id).expect("delete"));
    assert!(!store.delete_rule(&user, rule.id).expect("delete again"));
    assert!(store.update_rule(&user, &rule).is_err());
}

#[test]
fn unsafe_user_ids_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");

    assert!(store.create_rule(&UserId::from("../escape"), rent()).is_err());
    assert!(store.list_all_users().unwrap().is_empty());
}
