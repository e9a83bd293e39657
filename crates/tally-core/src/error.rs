use thiserror::Error;
use uuid::Uuid;

use tally_domain::MalformedRule;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Rule not found: {0}")]
    RuleNotFound(Uuid),
    #[error("Rule {0} is paused")]
    InactiveRule(Uuid),
    #[error("Cursor for rule {rule} cannot move back from {current} to {requested}")]
    CursorRegression {
        rule: Uuid,
        current: chrono::NaiveDate,
        requested: chrono::NaiveDate,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Malformed(#[from] MalformedRule),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
