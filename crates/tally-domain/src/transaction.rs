//! Domain models for ledger transactions and the generated-occurrence marker.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Suffix appended to the description of every transaction materialized from a rule.
pub const GENERATED_MARKER: &str = "(Recurring)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Enumerates the money-flow direction of a transaction.
pub enum TransactionKind {
    Expense,
    Income,
    Investment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
            TransactionKind::Investment => "investment",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            "investment" => Ok(TransactionKind::Investment),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

/// A persisted ledger entry. Identifiers and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Promotes a draft into a stored transaction.
    pub fn from_draft(id: Uuid, draft: TransactionDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: draft.amount,
            description: draft.description,
            date: draft.date,
            category: draft.category,
            category_id: draft.category_id,
            kind: draft.kind,
            created_at,
        }
    }

    /// Whether this entry carries the generated-marker for a rule described as `rule_description`.
    pub fn is_generated_from(&self, rule_description: &str) -> bool {
        self.description.contains(GENERATED_MARKER) && self.description.contains(rule_description)
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!(
            "{} {} {} [{}]",
            format_iso(self.date),
            self.description,
            self.amount,
            self.kind
        )
    }
}

/// Transaction payload submitted to the store before an identifier exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Builds the description used for a materialized occurrence.
pub fn generated_description(rule_description: &str) -> String {
    format!("{rule_description} {GENERATED_MARKER}")
}
