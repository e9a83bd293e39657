//! Upcoming-bill listing over a user's active rules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use tally_domain::RecurrenceRule;

pub const DEFAULT_UPCOMING_LIMIT: usize = 3;
const URGENT_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBill {
    pub rule_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    /// Negative when the cursor is already behind `today`.
    pub days_until: i64,
    pub urgent: bool,
}

pub struct UpcomingService;

impl UpcomingService {
    /// Active rules ordered by their next due date, truncated to `limit`.
    pub fn upcoming(rules: &[RecurrenceRule], today: NaiveDate, limit: usize) -> Vec<UpcomingBill> {
        let mut active: Vec<&RecurrenceRule> = rules.iter().filter(|rule| rule.active).collect();
        active.sort_by_key(|rule| (rule.next_due_date, rule.id));
        active
            .into_iter()
            .take(limit)
            .map(|rule| {
                let days_until = (rule.next_due_date - today).num_days();
                UpcomingBill {
                    rule_id: rule.id,
                    description: rule.description.clone(),
                    amount: rule.amount,
                    due_date: rule.next_due_date,
                    days_until,
                    urgent: (0..=URGENT_WINDOW_DAYS).contains(&days_until),
                }
            })
            .collect()
    }
}
