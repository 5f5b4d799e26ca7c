//! Types for the approval audit log.
//!
//! An entry is written only after an approval actually executed. Skipped,
//! blocked, cancelled, and failed calls leave no trace here.

use crate::policy::types::{ApprovalRule, CallDescriptor, Operation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed auto-approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// When the approval was executed (ISO-8601)
    pub timestamp: DateTime<Utc>,

    pub provider: String,

    pub operation: Operation,

    pub resource: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// The rule as it was when it matched.
    pub rule: RuleSnapshot,
}

/// The parts of a rule worth keeping once the config has moved on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSnapshot {
    pub repo_pattern: String,
    pub operations: Vec<Operation>,
    /// Seconds actually waited
    pub delay: f64,
}

impl AuditEntry {
    /// Build an entry for a call approved under `rule` after `delay` seconds.
    pub fn executed(call: &CallDescriptor, rule: &ApprovalRule, delay: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            provider: call.provider.clone(),
            operation: call.operation,
            resource: call.resource.clone(),
            repository: call.repository.clone(),
            file_path: call.file_path.clone(),
            rule: RuleSnapshot {
                repo_pattern: rule.repo_pattern.clone(),
                operations: rule.operations.clone(),
                delay,
            },
        }
    }
}
