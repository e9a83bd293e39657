//! Recurrence rules: user-defined templates for repeating transactions.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, frequency::Frequency, transaction::*};

/// A repeating obligation and the cursor tracking how far it has been materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub frequency: Frequency,
    /// Next occurrence not yet materialized. Only ever moves forward.
    pub next_due_date: NaiveDate,
    pub active: bool,
}

impl RecurrenceRule {
    pub fn from_draft(id: Uuid, draft: RuleDraft) -> Self {
        Self {
            id,
            amount: draft.amount,
            description: draft.description,
            category: draft.category,
            category_id: draft.category_id,
            kind: draft.kind,
            frequency: draft.frequency,
            next_due_date: draft.start_date,
            active: draft.active,
        }
    }

    /// Builds the transaction payload for the occurrence due on `date`.
    pub fn occurrence_draft(&self, date: NaiveDate) -> TransactionDraft {
        TransactionDraft {
            amount: self.amount,
            description: generated_description(&self.description),
            date,
            category: self.category.clone(),
            category_id: self.category_id.clone(),
            kind: self.kind,
        }
    }
}

impl Identifiable for RecurrenceRule {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for RecurrenceRule {
    fn display_label(&self) -> String {
        format!(
            "{} {} {} next {}{}",
            self.description,
            self.amount,
            self.frequency.label(),
            format_iso(self.next_due_date),
            if self.active { "" } else { " (paused)" }
        )
    }
}

/// Rule payload supplied by the user; the start date becomes the initial cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default = "RuleDraft::default_active")]
    pub active: bool,
}

impl RuleDraft {
    fn default_active() -> bool {
        true
    }
}

/// Field-level edits applied to an existing rule. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub category_id: Option<Option<String>>,
    pub kind: Option<TransactionKind>,
    pub frequency: Option<Frequency>,
    pub next_due_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

/// A stored rule document that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRule {
    pub id: Option<String>,
    pub reason: String,
}

impl fmt::Display for MalformedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "malformed rule {id}: {}", self.reason),
            None => write!(f, "malformed rule without id: {}", self.reason),
        }
    }
}

impl std::error::Error for MalformedRule {}

/// One entry of a rule listing; decoding failures are kept per document.
pub type RuleRecord = Result<RecurrenceRule, MalformedRule>;
