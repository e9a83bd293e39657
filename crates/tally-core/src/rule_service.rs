//! Services related to recurrence rule maintenance.

use rust_decimal::Decimal;
use uuid::Uuid;

use tally_domain::{find_by_id, RecurrenceRule, RuleDraft, RulePatch, RuleRecord, UserId};

use crate::{storage::PersistenceGateway, CoreError};

/// Provides validated helpers for creating and editing recurrence rules.
///
/// None of these helpers move a cursor backwards; only the materializer advances it.
pub struct RuleService;

impl RuleService {
    /// Validates and stores a new rule whose cursor starts at the draft's start date.
    pub fn create(
        gateway: &dyn PersistenceGateway,
        user: &UserId,
        mut draft: RuleDraft,
    ) -> Result<RecurrenceRule, CoreError> {
        draft.description = draft.description.trim().to_string();
        validate(draft.amount, &draft.description)?;
        let rule = gateway.create_rule(user, draft)?;
        tracing::info!(user = %user, rule = %rule.id, frequency = %rule.frequency, "recurring rule created");
        Ok(rule)
    }

    pub fn list(gateway: &dyn PersistenceGateway, user: &UserId) -> Result<Vec<RuleRecord>, CoreError> {
        gateway.list_rules(user)
    }

    pub fn find(
        gateway: &dyn PersistenceGateway,
        user: &UserId,
        id: Uuid,
    ) -> Result<RecurrenceRule, CoreError> {
        let rules = gateway.list_rules(user)?.into_iter().filter_map(Result::ok);
        find_by_id(rules, id).ok_or(CoreError::RuleNotFound(id))
    }

    /// Applies `patch` to the stored rule and writes it back.
    pub fn edit(
        gateway: &dyn PersistenceGateway,
        user: &UserId,
        id: Uuid,
        patch: RulePatch,
    ) -> Result<RecurrenceRule, CoreError> {
        let mut rule = Self::find(gateway, user, id)?;
        Self::apply_patch(&mut rule, patch)?;
        gateway.update_rule(user, &rule)?;
        tracing::info!(user = %user, rule = %rule.id, "recurring rule updated");
        Ok(rule)
    }

    /// Pauses or resumes a rule.
    pub fn set_active(
        gateway: &dyn PersistenceGateway,
        user: &UserId,
        id: Uuid,
        active: bool,
    ) -> Result<RecurrenceRule, CoreError> {
        Self::edit(
            gateway,
            user,
            id,
            RulePatch {
                active: Some(active),
                ..RulePatch::default()
            },
        )
    }

    /// Flips the active flag and returns the stored rule.
    pub fn toggle(
        gateway: &dyn PersistenceGateway,
        user: &UserId,
        id: Uuid,
    ) -> Result<RecurrenceRule, CoreError> {
        let current = Self::find(gateway, user, id)?;
        Self::set_active(gateway, user, id, !current.active)
    }

    pub fn delete(gateway: &dyn PersistenceGateway, user: &UserId, id: Uuid) -> Result<(), CoreError> {
        if gateway.delete_rule(user, id)? {
            tracing::info!(user = %user, rule = %id, "recurring rule deleted");
            Ok(())
        } else {
            Err(CoreError::RuleNotFound(id))
        }
    }

    /// Applies field edits in place, rejecting invalid values and cursor regressions.
    pub fn apply_patch(rule: &mut RecurrenceRule, patch: RulePatch) -> Result<(), CoreError> {
        let amount = patch.amount.unwrap_or(rule.amount);
        let description = patch
            .description
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| rule.description.clone());
        validate(amount, &description)?;
        if let Some(requested) = patch.next_due_date {
            if requested < rule.next_due_date {
                return Err(CoreError::CursorRegression {
                    rule: rule.id,
                    current: rule.next_due_date,
                    requested,
                });
            }
            rule.next_due_date = requested;
        }
        rule.amount = amount;
        rule.description = description;
        if let Some(category) = patch.category {
            rule.category = category;
        }
        if let Some(category_id) = patch.category_id {
            rule.category_id = category_id;
        }
        if let Some(kind) = patch.kind {
            rule.kind = kind;
        }
        if let Some(frequency) = patch.frequency {
            rule.frequency = frequency;
        }
        if let Some(active) = patch.active {
            rule.active = active;
        }
        Ok(())
    }
}

fn validate(amount: Decimal, description: &str) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if description.is_empty() {
        return Err(CoreError::Validation("description must not be empty".into()));
    }
    Ok(())
}
