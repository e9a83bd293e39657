//! tally-storage-json
//!
//! File-backed `PersistenceGateway`: one directory per user under `<root>/users/`, holding
//! `rules.json` and `transactions.json`. Rule documents stay raw JSON so a malformed one is
//! reported instead of failing the whole listing. Writes go through a temp file and a rename.
//!
//! ```
//! use tally_core::storage::PersistenceGateway;
//! use tally_domain::UserId;
//! use tally_storage_json::JsonStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
//! store.register_user(&UserId::from("alice")).unwrap();
//! assert_eq!(store.list_all_users().unwrap(), vec![UserId::from("alice")]);
//! assert!(dir.path().join("users/alice").is_dir());
//! ```

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tally_core::{storage::PersistenceGateway, CoreError};
use tally_domain::{
    MalformedRule, RecurrenceRule, RuleDraft, RuleRecord, Transaction, TransactionDraft, UserId,
};

const USERS_DIR: &str = "users";
const RULES_FILE: &str = "rules.json";
const TRANSACTIONS_FILE: &str = "transactions.json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed JSON persistence, one directory per user.
///
/// Layout: `<root>/users/<user>/rules.json` and `<root>/users/<user>/transactions.json`.
/// Rule documents are kept as raw JSON so a document that fails to decode is reported as
/// malformed and written back untouched.
#[derive(Clone)]
pub struct JsonStore {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(root.join(USERS_DIR))?;
        Ok(Self {
            root,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user: &UserId) -> Result<PathBuf, CoreError> {
        validate_user_id(user)?;
        Ok(self.root.join(USERS_DIR).join(user.as_str()))
    }

    /// Creates the user's directory so the user is visited by daily runs.
    pub fn register_user(&self, user: &UserId) -> Result<(), CoreError> {
        fs::create_dir_all(self.user_dir(user)?)?;
        Ok(())
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("json store lock poisoned".into()))
    }

    fn rules_path(&self, user: &UserId) -> Result<PathBuf, CoreError> {
        Ok(self.user_dir(user)?.join(RULES_FILE))
    }

    fn transactions_path(&self, user: &UserId) -> Result<PathBuf, CoreError> {
        Ok(self.user_dir(user)?.join(TRANSACTIONS_FILE))
    }
}

impl PersistenceGateway for JsonStore {
    fn list_all_users(&self) -> Result<Vec<UserId>, CoreError> {
        let dir = self.root.join(USERS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut users = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                let user = UserId::from(name);
                if validate_user_id(&user).is_ok() {
                    users.push(user);
                }
            }
        }
        users.sort();
        Ok(users)
    }

    fn list_rules(&self, user: &UserId) -> Result<Vec<RuleRecord>, CoreError> {
        let path = self.rules_path(user)?;
        let _guard = self.guard()?;
        let documents: Vec<Value> = read_json(&path)?;
        Ok(documents.into_iter().map(decode_rule).collect())
    }

    fn create_rule(&self, user: &UserId, draft: RuleDraft) -> Result<RecurrenceRule, CoreError> {
        let path = self.rules_path(user)?;
        let rule = RecurrenceRule::from_draft(Uuid::new_v4(), draft);
        let _guard = self.guard()?;
        let mut documents: Vec<Value> = read_json(&path)?;
        documents.push(serde_json::to_value(&rule)?);
        write_json(&path, &documents)?;
        Ok(rule)
    }

    fn update_rule(&self, user: &UserId, rule: &RecurrenceRule) -> Result<(), CoreError> {
        let path = self.rules_path(user)?;
        let _guard = self.guard()?;
        let mut documents: Vec<Value> = read_json(&path)?;
        let slot = documents
            .iter_mut()
            .find(|doc| document_id(doc) == Some(rule.id))
            .ok_or(CoreError::RuleNotFound(rule.id))?;
        *slot = serde_json::to_value(rule)?;
        write_json(&path, &documents)
    }

    fn delete_rule(&self, user: &UserId, id: Uuid) -> Result<bool, CoreError> {
        let path = self.rules_path(user)?;
        let _guard = self.guard()?;
        let mut documents: Vec<Value> = read_json(&path)?;
        let before = documents.len();
        documents.retain(|doc| document_id(doc) != Some(id));
        if documents.len() == before {
            return Ok(false);
        }
        write_json(&path, &documents)?;
        Ok(true)
    }

    fn list_transactions(&self, user: &UserId) -> Result<Vec<Transaction>, CoreError> {
        let path = self.transactions_path(user)?;
        let _guard = self.guard()?;
        read_json(&path)
    }

    fn create_transaction(
        &self,
        user: &UserId,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        let path = self.transactions_path(user)?;
        let transaction = Transaction::from_draft(Uuid::new_v4(), draft, Utc::now());
        let _guard = self.guard()?;
        let mut transactions: Vec<Transaction> = read_json(&path)?;
        transactions.push(transaction.clone());
        write_json(&path, &transactions)?;
        Ok(transaction)
    }
}

/// User ids become directory names, so only a conservative character set is accepted.
fn validate_user_id(user: &UserId) -> Result<(), CoreError> {
    let raw = user.as_str();
    let valid = !raw.is_empty()
        && !raw.starts_with('.')
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("invalid user id `{raw}`")))
    }
}

fn decode_rule(document: Value) -> RuleRecord {
    let id = document
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    serde_json::from_value(document).map_err(|err| MalformedRule {
        id,
        reason: err.to_string(),
    })
}

fn document_id(document: &Value) -> Option<Uuid> {
    document
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
