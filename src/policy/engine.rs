//! Rule evaluation — decides whether an intercepted call is auto-approved.
//!
//! Rules are evaluated **in order** within a provider, first match wins, the
//! same model as firewall rules. A rule matches when all of:
//! - its operation set contains the call's operation
//! - the call's repository (if any) matches `repoPattern`
//! - the call's file path (if any) matches one of `pathPatterns` (if any)
//!
//! Patterns are compiled once per config snapshot (`CompiledConfig`), not
//! per call. The store rebuilds the snapshot whenever the config changes.

use crate::policy::types::*;
use crate::utils::patterns::{CompiledMatcher, CompiledPattern};
use std::sync::Arc;

pub const REASON_NO_PROVIDER: &str = "no provider configuration";
pub const REASON_NO_MATCH: &str = "no matching rule";

/// A config snapshot with every rule pattern pre-compiled.
/// Built once per config, then used for every call evaluated against it.
#[derive(Debug)]
pub struct CompiledConfig {
    config: Arc<RootConfig>,
    /// Parallel to `config.providers`, and each inner list to its rules
    providers: Vec<Vec<CompiledRule>>,
}

/// The compiled patterns of one rule.
#[derive(Debug)]
struct CompiledRule {
    repo: CompiledPattern,
    paths: Option<CompiledMatcher>,
}

impl CompiledRule {
    fn new(rule: &ApprovalRule) -> Self {
        Self {
            repo: CompiledPattern::new(&rule.repo_pattern),
            paths: rule.path_patterns.as_deref().map(CompiledMatcher::new),
        }
    }

    fn matches(&self, rule: &ApprovalRule, call: &CallDescriptor) -> bool {
        if !rule.allows(call.operation) {
            return false;
        }

        // Calls without a repository skip the repo check entirely.
        if let Some(ref repo) = call.repository {
            if !self.repo.matches(repo) {
                return false;
            }
        }

        if let (Some(paths), Some(path)) = (&self.paths, &call.file_path) {
            if !paths.matches(path) {
                return false;
            }
        }

        true
    }
}

impl CompiledConfig {
    pub fn new(config: Arc<RootConfig>) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|p| p.rules.iter().map(CompiledRule::new).collect())
            .collect();
        Self { config, providers }
    }

    pub fn config(&self) -> &Arc<RootConfig> {
        &self.config
    }

    /// Evaluate a call and return a decision. First matching rule wins.
    pub fn evaluate(&self, call: &CallDescriptor) -> ApprovalDecision {
        let Some(index) = self
            .config
            .providers
            .iter()
            .position(|p| p.name == call.provider)
        else {
            return ApprovalDecision::skip(REASON_NO_PROVIDER);
        };

        let provider = &self.config.providers[index];
        for (rule, compiled) in provider.rules.iter().zip(&self.providers[index]) {
            if compiled.matches(rule, call) {
                let delay = rule.delay.unwrap_or(self.config.default_delay);
                return ApprovalDecision::matched(rule, delay);
            }
        }

        ApprovalDecision::skip(REASON_NO_MATCH)
    }
}

/// Evaluate a call against a config that has not been compiled yet.
pub fn evaluate_approval_rules(config: &RootConfig, call: &CallDescriptor) -> ApprovalDecision {
    CompiledConfig::new(Arc::new(config.clone())).evaluate(call)
}

/// Whether a single rule's predicate holds for a call.
pub fn rule_matches(rule: &ApprovalRule, call: &CallDescriptor) -> bool {
    CompiledRule::new(rule).matches(rule, call)
}
