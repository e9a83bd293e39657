//! Detection of duplicate generated transactions left behind by racing runs.
//!
//! The materializer's dedup read is best effort; two runs that both pass it for the same
//! date each create an occurrence. This pass reports such groups. It never merges or deletes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use tally_domain::{Identifiable, Transaction, GENERATED_MARKER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub date: NaiveDate,
    pub description: String,
    pub transaction_ids: Vec<Uuid>,
}

pub struct ReconcileService;

impl ReconcileService {
    /// Groups generated transactions by (date, description) and keeps groups of two or more.
    pub fn find_duplicates(transactions: &[Transaction]) -> Vec<DuplicateGroup> {
        let mut groups: BTreeMap<(NaiveDate, &str), Vec<&Transaction>> = BTreeMap::new();
        for txn in transactions
            .iter()
            .filter(|txn| txn.description.contains(GENERATED_MARKER))
        {
            groups
                .entry((txn.date, txn.description.as_str()))
                .or_default()
                .push(txn);
        }
        groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|((date, description), mut members)| {
                members.sort_by_key(|txn| txn.created_at);
                DuplicateGroup {
                    date,
                    description: description.to_string(),
                    transaction_ids: members.into_iter().map(Identifiable::id).collect(),
                }
            })
            .collect()
    }
}
