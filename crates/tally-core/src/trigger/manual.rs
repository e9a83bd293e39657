//! Manually invoked entry point for the unattended pass, guarded by a static bearer secret.
//!
//! Transport-agnostic: a host HTTP server passes the `Authorization` header in and writes the
//! returned status and JSON body out.

use std::sync::Arc;

use serde_json::{json, Value};
use subtle::ConstantTimeEq;

use crate::{time::Clock, trigger::unattended::DailyRun};

/// Status code and JSON body for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: Value,
}

impl TriggerResponse {
    fn unauthorized() -> Self {
        Self {
            status: 401,
            body: json!({ "error": "Unauthorized" }),
        }
    }
}

pub struct ManualTrigger {
    run: DailyRun,
    secret: Option<String>,
    clock: Arc<dyn Clock>,
}

impl ManualTrigger {
    /// A trigger without a configured secret rejects every request.
    pub fn new(run: DailyRun, secret: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            run,
            secret: secret.filter(|value| !value.is_empty()),
            clock,
        }
    }

    pub fn handle(&self, authorization: Option<&str>) -> TriggerResponse {
        if !is_authorized(authorization, self.secret.as_deref()) {
            tracing::warn!("rejected manual recurring trigger");
            return TriggerResponse::unauthorized();
        }
        let today = self.clock.today();
        match self.run.run(today) {
            Ok(report) => TriggerResponse {
                status: 200,
                body: json!({
                    "success": true,
                    "createdTransactions": report.totals.transactions_created,
                }),
            },
            Err(err) => {
                tracing::error!(error = %err, "manual recurring trigger failed");
                TriggerResponse {
                    status: 500,
                    body: json!({ "error": "Internal server error" }),
                }
            }
        }
    }
}

/// Compares the header against `Bearer <secret>` without short-circuiting on content.
pub fn is_authorized(header: Option<&str>, secret: Option<&str>) -> bool {
    let (Some(header), Some(secret)) = (header, secret) else {
        return false;
    };
    let expected = format!("Bearer {secret}");
    header.as_bytes().ct_eq(expected.as_bytes()).into()
}
