//! In-process [`PersistenceGateway`] used by tests, demos and embedded callers.

use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use uuid::Uuid;

use tally_domain::{
    MalformedRule, RecurrenceRule, RuleDraft, RuleRecord, Transaction, TransactionDraft, UserId,
};

use crate::{storage::PersistenceGateway, CoreError};

#[derive(Debug, Default, Clone)]
struct Partition {
    rules: Vec<RuleRecord>,
    transactions: Vec<Transaction>,
}

/// Keeps every user partition in memory behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    users: RwLock<BTreeMap<UserId, Partition>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with an empty partition.
    pub fn add_user(&self, user: &UserId) -> Result<(), CoreError> {
        self.write()?.entry(user.clone()).or_default();
        Ok(())
    }

    /// Stores a rule document that cannot be decoded, as a corrupted store would return it.
    pub fn insert_malformed(&self, user: &UserId, malformed: MalformedRule) -> Result<(), CoreError> {
        self.write()?
            .entry(user.clone())
            .or_default()
            .rules
            .push(Err(malformed));
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<UserId, Partition>>, CoreError> {
        self.users
            .read()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<UserId, Partition>>, CoreError> {
        self.users
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }
}

impl PersistenceGateway for MemoryGateway {
    fn list_all_users(&self) -> Result<Vec<UserId>, CoreError> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn list_rules(&self, user: &UserId) -> Result<Vec<RuleRecord>, CoreError> {
        Ok(self
            .read()?
            .get(user)
            .map(|partition| partition.rules.clone())
            .unwrap_or_default())
    }

    fn create_rule(&self, user: &UserId, draft: RuleDraft) -> Result<RecurrenceRule, CoreError> {
        let rule = RecurrenceRule::from_draft(Uuid::new_v4(), draft);
        self.write()?
            .entry(user.clone())
            .or_default()
            .rules
            .push(Ok(rule.clone()));
        Ok(rule)
    }

    fn update_rule(&self, user: &UserId, rule: &RecurrenceRule) -> Result<(), CoreError> {
        let mut users = self.write()?;
        let slot = users
            .get_mut(user)
            .and_then(|partition| {
                partition
                    .rules
                    .iter_mut()
                    .find(|record| matches!(record, Ok(stored) if stored.id == rule.id))
            })
            .ok_or(CoreError::RuleNotFound(rule.id))?;
        *slot = Ok(rule.clone());
        Ok(())
    }

    fn delete_rule(&self, user: &UserId, id: Uuid) -> Result<bool, CoreError> {
        let mut users = self.write()?;
        let Some(partition) = users.get_mut(user) else {
            return Ok(false);
        };
        let before = partition.rules.len();
        partition
            .rules
            .retain(|record| !matches!(record, Ok(stored) if stored.id == id));
        Ok(partition.rules.len() != before)
    }

    fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .read()?
            .get(user)
            .map(|partition| partition.transactions.clone())
            .unwrap_or_default())
    }

    fn create_transaction(
        &self,
        user: &UserId,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        let transaction = Transaction::from_draft(Uuid::new_v4(), draft, Utc::now());
        self.write()?
            .entry(user.clone())
            .or_default()
            .transactions
            .push(transaction.clone());
        Ok(transaction)
    }
}
