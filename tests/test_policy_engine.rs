//! Integration tests for rule evaluation.
//! Tests the full flow: JSON config → validation → evaluation.

use autoapprove::policy::defaults::default_config;
use autoapprove::policy::validate::{parse_config, validate_config, ValidationError};
use autoapprove::policy::{evaluate_approval_rules, CallDescriptor, Operation, RootConfig};

/// Helper: load the test fixture config.
fn test_config() -> RootConfig {
    let json = include_str!("fixtures/test_config.json");
    parse_config(json).expect("Failed to parse test config")
}

fn call(op: Operation, repo: &str, path: Option<&str>) -> CallDescriptor {
    let mut call = CallDescriptor::new("github", op).with_repository(repo);
    call.file_path = path.map(str::to_string);
    call
}

#[test]
fn test_fixture_is_valid() {
    let config = test_config();
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.default_delay, 5.0);
    assert_eq!(config.providers[0].rules.len(), 4);
}

#[test]
fn test_omitted_rule_flags_default_off() {
    let config = test_config();
    let rule = &config.providers[0].rules[0];
    assert_eq!(rule.delay, None);
    assert!(rule.path_patterns.is_none());
    assert!(!rule.require_confirmation);
    assert!(!rule.notify_on_approval);
}

#[test]
fn test_earlier_manual_rule_wins() {
    let config = test_config();
    let decision =
        evaluate_approval_rules(&config, &call(Operation::Update, "acme/secrets", Some("docs/a.md")));
    assert!(!decision.auto_approve);
    assert_eq!(decision.rule.unwrap().repo_pattern, "acme/secrets");
}

#[test]
fn test_path_patterns() {
    let config = test_config();

    for path in ["docs/guide/intro.txt", "src/README.md", "docs/v2/notes.md"] {
        let decision =
            evaluate_approval_rules(&config, &call(Operation::Create, "acme/web", Some(path)));
        assert!(decision.auto_approve, "create at {} should be approved", path);
        assert_eq!(decision.delay, 0.0);
    }

    for path in ["src/main.rs", "scripts/deploy.sh", "docs", "README.txt"] {
        let decision =
            evaluate_approval_rules(&config, &call(Operation::Create, "acme/web", Some(path)));
        assert!(!decision.auto_approve, "create at {} should not be approved", path);
    }
}

#[test]
fn test_explicit_delete_rule() {
    let config = test_config();
    let decision =
        evaluate_approval_rules(&config, &call(Operation::Delete, "acme/sandbox", Some("x")));
    assert!(decision.auto_approve);
    assert_eq!(decision.delay, 1.0);

    let decision = evaluate_approval_rules(&config, &call(Operation::Delete, "acme/web", None));
    assert!(!decision.auto_approve);
}

#[test]
fn test_default_delay_applies() {
    let config = test_config();
    let decision = evaluate_approval_rules(&config, &call(Operation::Read, "anyone/anything", None));
    assert!(decision.auto_approve);
    assert_eq!(decision.delay, 5.0);
}

#[test]
fn test_owner_prefix_is_literal() {
    let config = default_config();
    for repo in ["other/repo", "owners/repo", "acme/owner"] {
        let decision =
            evaluate_approval_rules(&config, &call(Operation::Create, repo, Some("docs/x.md")));
        assert!(!decision.auto_approve, "{} should not match owner/*", repo);
    }
}

#[test]
fn test_default_config_scenarios() {
    let config = default_config();

    let decision =
        evaluate_approval_rules(&config, &call(Operation::Create, "owner/repo", Some("docs/readme.md")));
    assert!(decision.auto_approve);
    assert_eq!(decision.delay, 2.0);

    for path in [None, Some("docs/readme.md"), Some("anything/else.rs")] {
        let decision = evaluate_approval_rules(&config, &call(Operation::Delete, "owner/repo", path));
        assert!(!decision.auto_approve);
    }
}

#[test]
fn test_validation_collects_every_error() {
    let json = r#"{
        "enabled": true,
        "defaultDelay": 90,
        "providers": [
            {"name": "github", "rules": [{"repoPattern": "", "operations": ["create"], "autoApprove": true, "delay": 61}]},
            {"name": "github", "rules": []}
        ]
    }"#;
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    let config: RootConfig = serde_json::from_value(value).unwrap();
    let errors = validate_config(&config).unwrap_err();

    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::DefaultDelayOutOfRange { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::EmptyRepoPattern { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::RuleDelayOutOfRange { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::DuplicateProvider { .. })));
}

#[test]
fn test_wrong_shapes_rejected() {
    assert!(parse_config("[]").is_err());
    assert!(parse_config(r#"{"enabled":true,"defaultDelay":3,"providers":{}}"#).is_err());
    assert!(parse_config("not json").is_err());
}
