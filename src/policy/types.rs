//! Core types for the approval policy.
//!
//! These types define the persisted configuration (root config, providers,
//! rules), the ephemeral call descriptor produced by the interceptor, and the
//! decision the engine derives from them. Field names serialize in camelCase
//! so the persisted record and the import/export file share one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// The kind of change an intercepted tool call wants to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Read,
    /// Socket messages that carry no operation field.
    Unknown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Read => write!(f, "read"),
            Operation::Unknown => write!(f, "unknown"),
        }
    }
}

impl Operation {
    /// Parse an operation from a canonical name or an HTTP verb.
    /// Returns None for anything unrecognized so callers pick their own fallback.
    pub fn from_str_loose(s: &str) -> Option<Operation> {
        match s.trim().to_lowercase().as_str() {
            "create" | "post" => Some(Operation::Create),
            "update" | "put" | "patch" => Some(Operation::Update),
            "delete" | "remove" => Some(Operation::Delete),
            "read" | "get" | "head" => Some(Operation::Read),
            "unknown" => Some(Operation::Unknown),
            _ => None,
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, Operation::Delete)
    }
}

/// One observed MCP call, normalized from a request body or socket message.
/// Consumed once by the orchestrator; never persisted.
///
/// Decoding is lenient since descriptors also arrive from other contexts:
/// the id is always assigned locally, the operation accepts HTTP verbs, and
/// the timestamp may be RFC 3339 text or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDescriptor {
    /// Correlation id. Never taken from the wire, so two received calls
    /// can't share one.
    #[serde(skip_deserializing, default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Normalized provider name (e.g. "github")
    pub provider: String,

    #[serde(default = "unknown_operation", deserialize_with = "lenient_operation")]
    pub operation: Operation,

    #[serde(default = "default_resource")]
    pub resource: String,

    /// "owner/repo"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// The original body or message, kept verbatim.
    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

fn default_resource() -> String {
    "file".to_string()
}

fn unknown_operation() -> Operation {
    Operation::Unknown
}

fn lenient_operation<'de, D>(deserializer: D) -> Result<Operation, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(Operation::from_str_loose)
        .unwrap_or(Operation::Unknown))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(Utc::now))
}

impl CallDescriptor {
    pub fn new(provider: impl Into<String>, operation: Operation) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: provider.into(),
            operation,
            resource: default_resource(),
            repository: None,
            file_path: None,
            metadata: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Short human-readable summary for prompts and logs.
    pub fn summary(&self) -> String {
        let mut s = format!("{} {} {}", self.provider, self.operation, self.resource);
        if let Some(ref repo) = self.repository {
            s.push_str(&format!(" in {}", repo));
        }
        if let Some(ref path) = self.file_path {
            s.push_str(&format!(" at {}", path));
        }
        s
    }
}

/// A single approval rule. Rules are evaluated in order; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRule {
    /// Matched against `owner/repo` with the pattern matcher.
    pub repo_pattern: String,

    pub operations: Vec<Operation>,

    /// When present, the call's file path must match at least one entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_patterns: Option<Vec<String>>,

    pub auto_approve: bool,

    /// Seconds. Falls back to the root default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    #[serde(default)]
    pub require_confirmation: bool,

    #[serde(default)]
    pub notify_on_approval: bool,
}

impl ApprovalRule {
    pub fn allows(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Human-readable description (used in logs and the config panel).
    pub fn describe(&self) -> String {
        let ops = self
            .operations
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let verdict = if self.auto_approve { "approve" } else { "manual" };
        let mut desc = format!("{}:{}:{}", verdict, self.repo_pattern, ops);
        if let Some(ref paths) = self.path_patterns {
            desc.push_str(&format!(":paths:{}", paths.join(",")));
        }
        desc
    }
}

/// Rules scoped to one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub rules: Vec<ApprovalRule>,
}

/// The whole persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootConfig {
    pub enabled: bool,
    /// Seconds, within `[0, 60]`.
    pub default_delay: f64,
    /// Unique by name.
    pub providers: Vec<ProviderConfig>,
}

impl RootConfig {
    /// Exact-name provider lookup.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// The result of evaluating one call against the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub auto_approve: bool,
    /// The rule that matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ApprovalRule>,
    /// Seconds to wait before approving.
    pub delay: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApprovalDecision {
    pub fn matched(rule: &ApprovalRule, delay: f64) -> Self {
        Self {
            auto_approve: rule.auto_approve,
            rule: Some(rule.clone()),
            delay,
            reason: if rule.auto_approve {
                None
            } else {
                Some("matched rule does not auto-approve".to_string())
            },
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            auto_approve: false,
            rule: None,
            delay: 0.0,
            reason: Some(reason.into()),
        }
    }

    pub fn delay_duration(&self) -> Duration {
        delay_duration(self.delay)
    }
}

/// Convert a delay in (possibly fractional) seconds to a `Duration`.
/// Negative or non-finite values collapse to zero.
pub fn delay_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.auto_approve {
            write!(f, "auto-approve after {}s", self.delay)
        } else {
            write!(
                f,
                "manual: {}",
                self.reason.as_deref().unwrap_or("not auto-approved")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_loose_parsing() {
        assert_eq!(Operation::from_str_loose("POST"), Some(Operation::Create));
        assert_eq!(Operation::from_str_loose("patch"), Some(Operation::Update));
        assert_eq!(Operation::from_str_loose("PUT"), Some(Operation::Update));
        assert_eq!(Operation::from_str_loose("DELETE"), Some(Operation::Delete));
        assert_eq!(Operation::from_str_loose(" read "), Some(Operation::Read));
        assert_eq!(Operation::from_str_loose("OPTIONS"), None);
    }

    #[test]
    fn test_config_uses_camel_case() {
        let json = r#"{
            "enabled": true,
            "defaultDelay": 3,
            "providers": [{
                "name": "github",
                "rules": [{
                    "repoPattern": "owner/*",
                    "operations": ["create"],
                    "pathPatterns": ["docs/**"],
                    "autoApprove": true,
                    "requireConfirmation": true
                }]
            }]
        }"#;
        let config: RootConfig = serde_json::from_str(json).unwrap();
        let rule = &config.provider("github").unwrap().rules[0];
        assert_eq!(rule.repo_pattern, "owner/*");
        assert_eq!(rule.delay, None);
        assert!(rule.require_confirmation);
        assert!(!rule.notify_on_approval);
        assert!(config.provider("gitlab").is_none());
    }

    #[test]
    fn test_descriptor_defaults_when_deserialized() {
        let d: CallDescriptor =
            serde_json::from_str(r#"{"provider":"github","operation":"update"}"#).unwrap();
        assert_eq!(d.resource, "file");
        assert!(d.repository.is_none());
        assert_eq!(d.metadata, serde_json::Value::Null);
    }

    #[test]
    fn test_descriptor_decodes_foreign_shapes() {
        let d: CallDescriptor = serde_json::from_str(
            r#"{"provider":"github","operation":"POST","timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(d.operation, Operation::Create);
        assert_eq!(d.timestamp.timestamp_millis(), 1_700_000_000_000);

        let d: CallDescriptor = serde_json::from_str(
            r#"{"provider":"github","operation":"frobnicate","timestamp":"2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(d.operation, Operation::Unknown);
        assert_eq!(d.timestamp.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        let before = Utc::now();
        let d: CallDescriptor =
            serde_json::from_str(r#"{"provider":"github","timestamp":"yesterday"}"#).unwrap();
        assert_eq!(d.operation, Operation::Unknown);
        assert!(d.timestamp >= before);
    }

    #[test]
    fn test_descriptor_id_is_never_taken_from_input() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"id":"{}","provider":"github","operation":"create"}}"#, id);
        let a: CallDescriptor = serde_json::from_str(&raw).unwrap();
        let b: CallDescriptor = serde_json::from_str(&raw).unwrap();
        assert_ne!(a.id, id);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_summary() {
        let d = CallDescriptor::new("github", Operation::Create)
            .with_repository("owner/repo")
            .with_file_path("docs/x.md");
        assert_eq!(d.summary(), "github create file in owner/repo at docs/x.md");
    }
}
