//! Config linter — detects risky or dead rules and suggests fixes.
//!
//! Validation decides whether a config can be used at all; the linter only
//! advises. `autoapprove check` prints these after a config validates.

use crate::policy::types::*;
use crate::utils::patterns::is_catch_all;
use colored::Colorize;

/// A lint warning: something the user should know about their config.
#[derive(Debug)]
pub struct LintWarning {
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something that could auto-approve more than intended
    Warning,
    /// A suggestion for improvement
    Info,
}

impl LintWarning {
    fn warn(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: None,
        }
    }

    fn warn_with_fix(msg: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: Some(fix.into()),
        }
    }

    fn info(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: msg.into(),
            suggestion: None,
        }
    }

    /// Format for terminal output.
    pub fn display(&self) -> String {
        let icon = match self.severity {
            Severity::Warning => "⚠".yellow().to_string(),
            Severity::Info => "ℹ".blue().to_string(),
        };
        let mut out = format!("  {} {}", icon, self.message);
        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!("\n    {}: {}", "Fix".green(), suggestion));
        }
        out
    }
}

/// Lint a config and return warnings.
pub fn lint_config(config: &RootConfig) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    if !config.enabled {
        warnings.push(LintWarning::info(
            "Auto-approval is disabled — every call needs a manual click",
        ));
    }

    for provider in &config.providers {
        check_delete_auto_approve(provider, &mut warnings);
        check_catch_all_auto_approve(provider, &mut warnings);
        check_empty_operations(provider, &mut warnings);
        check_instant_confirmation(provider, &mut warnings);
        check_rule_ordering(provider, &mut warnings);
        check_delete_rule_present(provider, &mut warnings);
    }

    warnings
}

/// Check: does any rule auto-approve deletes?
fn check_delete_auto_approve(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    for (i, rule) in provider.rules.iter().enumerate() {
        if rule.auto_approve && rule.allows(Operation::Delete) {
            warnings.push(LintWarning::warn_with_fix(
                format!(
                    "{} rule {} auto-approves deletes in '{}'",
                    provider.name,
                    i + 1,
                    rule.repo_pattern
                ),
                "Remove \"delete\" from its operations, or set \"autoApprove\": false",
            ));
        }
    }
}

/// Check: does any rule auto-approve everything in every repository?
fn check_catch_all_auto_approve(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    for (i, rule) in provider.rules.iter().enumerate() {
        if rule.auto_approve && is_catch_all(&rule.repo_pattern) && rule.path_patterns.is_none() {
            warnings.push(LintWarning::warn_with_fix(
                format!(
                    "{} rule {} auto-approves {} in every repository and path",
                    provider.name,
                    i + 1,
                    operations_list(rule)
                ),
                "Narrow \"repoPattern\" (e.g. \"owner/*\") or add \"pathPatterns\"",
            ));
        }
    }
}

/// Check: rules with no operations can never match.
fn check_empty_operations(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    for (i, rule) in provider.rules.iter().enumerate() {
        if rule.operations.is_empty() {
            warnings.push(LintWarning::info(format!(
                "{} rule {} lists no operations and never matches",
                provider.name,
                i + 1
            )));
        }
    }
}

/// Check: a confirmation countdown of zero seconds cannot be cancelled.
fn check_instant_confirmation(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    for (i, rule) in provider.rules.iter().enumerate() {
        if rule.auto_approve && rule.require_confirmation && rule.delay == Some(0.0) {
            warnings.push(LintWarning::warn(format!(
                "{} rule {} requires confirmation but has a 0s delay, so there is no time to cancel",
                provider.name,
                i + 1
            )));
        }
    }
}

/// Check: a broad rule before a narrower one shadows it (first match wins).
fn check_rule_ordering(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    for (i, broad) in provider.rules.iter().enumerate() {
        if !is_catch_all(&broad.repo_pattern) || broad.path_patterns.is_some() {
            continue;
        }
        for (j, later) in provider.rules.iter().enumerate().skip(i + 1) {
            let covered = !later.operations.is_empty()
                && later.operations.iter().all(|op| broad.allows(*op));
            if covered {
                warnings.push(LintWarning::warn(format!(
                    "{} rule {} is shadowed by rule {} ('{}' covers the same operations) — it will never match (first match wins)",
                    provider.name,
                    j + 1,
                    i + 1,
                    broad.repo_pattern
                )));
            }
        }
    }
}

/// Check: is there an explicit rule documenting what happens to deletes?
fn check_delete_rule_present(provider: &ProviderConfig, warnings: &mut Vec<LintWarning>) {
    if !provider.rules.iter().any(|r| r.allows(Operation::Delete)) {
        warnings.push(LintWarning::info(format!(
            "{} has no rule for delete — deletes stay manual, but an explicit rule is clearer",
            provider.name
        )));
    }
}

fn operations_list(rule: &ApprovalRule) -> String {
    rule.operations
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::defaults::default_config;

    fn rule(repo: &str, ops: &[Operation], auto: bool) -> ApprovalRule {
        ApprovalRule {
            repo_pattern: repo.to_string(),
            operations: ops.to_vec(),
            path_patterns: None,
            auto_approve: auto,
            delay: Some(2.0),
            require_confirmation: true,
            notify_on_approval: false,
        }
    }

    fn provider(rules: Vec<ApprovalRule>) -> RootConfig {
        RootConfig {
            enabled: true,
            default_delay: 3.0,
            providers: vec![ProviderConfig {
                name: "github".to_string(),
                rules,
            }],
        }
    }

    #[test]
    fn test_default_config_has_no_warnings() {
        let warnings = lint_config(&default_config());
        let warning_count = warnings
            .iter()
            .filter(|w| w.severity == Severity::Warning)
            .count();
        assert_eq!(
            warning_count,
            0,
            "defaults should lint clean, got {:?}",
            warnings.iter().map(|w| &w.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_permissive_config_is_flagged() {
        let config = provider(vec![rule(
            "*",
            &[Operation::Create, Operation::Update, Operation::Delete],
            true,
        )]);
        let warnings = lint_config(&config);
        assert!(warnings.iter().any(|w| w.message.contains("auto-approves deletes")));
        assert!(warnings.iter().any(|w| w.message.contains("every repository")));
    }

    #[test]
    fn test_shadowed_rule() {
        let config = provider(vec![
            rule("*", &[Operation::Create, Operation::Delete], false),
            rule("owner/*", &[Operation::Create], true),
        ]);
        let warnings = lint_config(&config);
        assert!(warnings.iter().any(|w| w.message.contains("first match wins")));
    }

    #[test]
    fn test_zero_delay_confirmation() {
        let mut r = rule("owner/*", &[Operation::Create], true);
        r.delay = Some(0.0);
        let warnings = lint_config(&provider(vec![r]));
        assert!(warnings.iter().any(|w| w.message.contains("no time to cancel")));
    }
}
