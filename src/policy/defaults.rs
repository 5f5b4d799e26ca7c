//! Built-in configuration shipped on first run.
//!
//! One provider ("github") with two rules:
//! - documentation and script changes in the user's own repos are
//!   auto-approved after a short, cancellable countdown
//! - deletes anywhere are never auto-approved
//!
//! Whatever else changes here, the default must never auto-approve a delete.

use crate::policy::types::{ApprovalRule, Operation, ProviderConfig, RootConfig};

/// Storage key for the persisted root config.
pub const CONFIG_KEY: &str = "mcp-auto-approve-config";

/// Storage key for the persisted audit log.
pub const AUDIT_LOG_KEY: &str = "mcp-auto-approve-audit-log";

/// Where an unreadable audit log is moved before a fresh one replaces it.
pub const AUDIT_LOG_BACKUP_KEY: &str = "mcp-auto-approve-audit-log.corrupt";

/// Name of the cross-context broadcast channel.
pub const BROADCAST_CHANNEL: &str = "mcp-auto-approve";

/// Upper bound for any delay, in seconds.
pub const MAX_DELAY_SECS: f64 = 60.0;

pub const DEFAULT_DELAY_SECS: f64 = 3.0;

/// Most-recent audit entries kept.
pub const AUDIT_LOG_CAPACITY: usize = 100;

/// Labels the approval button is recognized by, in the host's UI languages.
pub const DEFAULT_APPROVAL_LABELS: &[&str] = &["Approve", "承認"];

/// The default root config.
pub fn default_config() -> RootConfig {
    RootConfig {
        enabled: true,
        default_delay: DEFAULT_DELAY_SECS,
        providers: vec![ProviderConfig {
            name: "github".to_string(),
            rules: vec![
                ApprovalRule {
                    repo_pattern: "owner/*".to_string(),
                    operations: vec![Operation::Create, Operation::Update],
                    path_patterns: Some(vec![
                        "docs/**".to_string(),
                        "scripts/**".to_string(),
                        "**/*.md".to_string(),
                    ]),
                    auto_approve: true,
                    delay: Some(2.0),
                    require_confirmation: true,
                    notify_on_approval: true,
                },
                ApprovalRule {
                    repo_pattern: "*".to_string(),
                    operations: vec![Operation::Delete],
                    path_patterns: None,
                    auto_approve: false,
                    delay: None,
                    require_confirmation: true,
                    notify_on_approval: false,
                },
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_never_auto_approves_delete() {
        let config = default_config();
        for provider in &config.providers {
            for rule in &provider.rules {
                if rule.allows(Operation::Delete) {
                    assert!(
                        !rule.auto_approve,
                        "default rule {} auto-approves delete",
                        rule.describe()
                    );
                }
            }
        }
    }

    #[test]
    fn test_default_is_valid() {
        let config = default_config();
        assert!(crate::policy::validate::validate_config(&config).is_ok());
        assert!(config.default_delay <= MAX_DELAY_SECS);
    }
}
