//! Config parsing and validation.
//!
//! Validation is pure: it returns either the validated config or the full list
//! of problems found. Callers decide what to do with a failure. The store
//! falls back to defaults on load and rejects the change on update/import.

use crate::error::ConfigError;
use crate::policy::defaults::MAX_DELAY_SECS;
use crate::policy::types::RootConfig;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// One structural or range problem in a config.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("config must be a JSON object")]
    NotAnObject,

    #[error("'providers' must be a list")]
    ProvidersNotList,

    #[error("'defaultDelay' must be a number of seconds within [0, {max}] (got {value})")]
    DefaultDelayOutOfRange { value: String, max: f64 },

    #[error("provider #{index} has an empty name")]
    EmptyProviderName { index: usize },

    #[error("provider '{name}' is configured more than once")]
    DuplicateProvider { name: String },

    #[error("provider '{provider}' rule #{index}: empty repoPattern")]
    EmptyRepoPattern { provider: String, index: usize },

    #[error("provider '{provider}' rule #{index}: delay {delay}s is outside [0, {max}]")]
    RuleDelayOutOfRange {
        provider: String,
        index: usize,
        delay: f64,
        max: f64,
    },
}

/// Delays may be fractional but must be finite and within `[0, MAX_DELAY_SECS]`.
pub fn delay_in_range(secs: f64) -> bool {
    secs.is_finite() && (0.0..=MAX_DELAY_SECS).contains(&secs)
}

/// Validate an already-typed config.
pub fn validate_config(config: &RootConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !delay_in_range(config.default_delay) {
        errors.push(ValidationError::DefaultDelayOutOfRange {
            value: config.default_delay.to_string(),
            max: MAX_DELAY_SECS,
        });
    }

    let mut seen = HashSet::new();
    for (i, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            errors.push(ValidationError::EmptyProviderName { index: i });
        } else if !seen.insert(provider.name.as_str()) {
            errors.push(ValidationError::DuplicateProvider {
                name: provider.name.clone(),
            });
        }

        for (j, rule) in provider.rules.iter().enumerate() {
            if rule.repo_pattern.is_empty() {
                errors.push(ValidationError::EmptyRepoPattern {
                    provider: provider.name.clone(),
                    index: j,
                });
            }
            if let Some(delay) = rule.delay {
                if !delay_in_range(delay) {
                    errors.push(ValidationError::RuleDelayOutOfRange {
                        provider: provider.name.clone(),
                        index: j,
                        delay,
                        max: MAX_DELAY_SECS,
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Structural checks that must run before typed deserialization, so that a
/// wrong-shaped record is reported as a validation failure rather than an
/// opaque serde error.
fn check_shape(value: &Value) -> Vec<ValidationError> {
    let Some(obj) = value.as_object() else {
        return vec![ValidationError::NotAnObject];
    };

    let mut errors = Vec::new();

    if !obj.get("providers").is_some_and(Value::is_array) {
        errors.push(ValidationError::ProvidersNotList);
    }

    match obj.get("defaultDelay") {
        Some(v) if v.as_f64().is_some_and(delay_in_range) => {}
        Some(v) => errors.push(ValidationError::DefaultDelayOutOfRange {
            value: v.to_string(),
            max: MAX_DELAY_SECS,
        }),
        None => errors.push(ValidationError::DefaultDelayOutOfRange {
            value: "missing".to_string(),
            max: MAX_DELAY_SECS,
        }),
    }

    errors
}

/// Parse and validate a config from JSON text.
pub fn parse_config(text: &str) -> Result<RootConfig, ConfigError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ConfigError::invalid(format!("not valid JSON ({})", e)))?;
    parse_config_value(value)
}

/// Validate and convert an already-parsed JSON value.
pub fn parse_config_value(value: Value) -> Result<RootConfig, ConfigError> {
    let shape_errors = check_shape(&value);
    if !shape_errors.is_empty() {
        return Err(ConfigError::Validation(shape_errors));
    }

    let config: RootConfig =
        serde_json::from_value(value).map_err(|e| ConfigError::invalid(e.to_string()))?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::defaults::default_config;

    #[test]
    fn test_default_round_trips_through_parser() {
        let text = serde_json::to_string_pretty(&default_config()).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed, default_config());
    }

    #[test]
    fn test_providers_must_be_a_list() {
        let err = parse_config(r#"{"enabled":true,"defaultDelay":3,"providers":{}}"#).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.contains(&ValidationError::ProvidersNotList))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_default_delay_range() {
        for bad in ["-1", "61", "60.5", "\"3\"", "null"] {
            let text = format!(
                r#"{{"enabled":true,"defaultDelay":{},"providers":[]}}"#,
                bad
            );
            let err = parse_config(&text).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation(_)),
                "defaultDelay {} should be rejected, got {:?}",
                bad,
                err
            );
        }
        assert!(parse_config(r#"{"enabled":true,"defaultDelay":0,"providers":[]}"#).is_ok());
        assert!(parse_config(r#"{"enabled":true,"defaultDelay":60,"providers":[]}"#).is_ok());

        let config =
            parse_config(r#"{"enabled":true,"defaultDelay":2.5,"providers":[]}"#).unwrap();
        assert_eq!(config.default_delay, 2.5);
    }

    #[test]
    fn test_fractional_rule_delay() {
        let config = parse_config(
            r#"{"enabled":true,"defaultDelay":3,"providers":[
                {"name":"github","rules":[{"repoPattern":"owner/*","operations":["create"],"autoApprove":true,"delay":1.5}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.providers[0].rules[0].delay, Some(1.5));

        let mut bad = config.clone();
        bad.providers[0].rules[0].delay = Some(f64::NAN);
        assert!(validate_config(&bad).is_err());
        bad.providers[0].rules[0].delay = Some(-0.5);
        assert!(validate_config(&bad).is_err());
    }

    #[test]
    fn test_duplicate_providers_rejected() {
        let mut config = default_config();
        config.providers.push(config.providers[0].clone());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateProvider {
                name: "github".to_string()
            }]
        );
    }

    #[test]
    fn test_rule_delay_range() {
        let mut config = default_config();
        config.providers[0].rules[0].delay = Some(120.0);
        let errors = validate_config(&config).unwrap_err();
        match &errors[0] {
            ValidationError::RuleDelayOutOfRange { delay, .. } => assert_eq!(*delay, 120.0),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_json() {
        let err = parse_config("not json at all").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
