use chrono::NaiveDate;
use uuid::Uuid;

use tally_domain::{
    MalformedRule, RecurrenceRule, RuleDraft, RuleRecord, Transaction, TransactionDraft, UserId,
};

use crate::CoreError;

/// Abstraction over the document store holding per-user rules and transactions.
///
/// Every call is a single point read or write; no cross-call transaction is implied.
pub trait PersistenceGateway: Send + Sync {
    fn list_all_users(&self) -> Result<Vec<UserId>, CoreError>;

    /// Lists every rule document of `user`, keeping undecodable documents as errors.
    fn list_rules(&self, user: &UserId) -> Result<Vec<RuleRecord>, CoreError>;

    /// Lists active rules. Malformed documents are passed through so callers can report them.
    fn list_active_rules(&self, user: &UserId) -> Result<Vec<RuleRecord>, CoreError> {
        Ok(self
            .list_rules(user)?
            .into_iter()
            .filter(|record| match record {
                Ok(rule) => rule.active,
                Err(_) => true,
            })
            .collect())
    }

    fn create_rule(&self, user: &UserId, draft: RuleDraft) -> Result<RecurrenceRule, CoreError>;

    /// Replaces the stored rule document, cursor included.
    fn update_rule(&self, user: &UserId, rule: &RecurrenceRule) -> Result<(), CoreError>;

    /// Removes a rule, returning whether it existed.
    fn delete_rule(&self, user: &UserId, id: Uuid) -> Result<bool, CoreError>;

    fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, CoreError>;

    fn list_transactions_on_date(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .list_transactions(user)?
            .into_iter()
            .filter(|txn| txn.date == date)
            .collect())
    }

    /// Persists a new transaction; the store assigns its id and creation time.
    fn create_transaction(
        &self,
        user: &UserId,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError>;
}

/// Splits a rule listing into decodable rules and malformed documents.
pub fn partition_records(records: Vec<RuleRecord>) -> (Vec<RecurrenceRule>, Vec<MalformedRule>) {
    let mut rules = Vec::new();
    let mut malformed = Vec::new();
    for record in records {
        match record {
            Ok(rule) => rules.push(rule),
            Err(err) => malformed.push(err),
        }
    }
    (rules, malformed)
}
