//! Error types for autoapprove.
//!
//! Library-facing errors are typed with `thiserror`. The CLI layer wraps them
//! in `anyhow` with context at the boundary.

use crate::policy::validate::ValidationError;
use thiserror::Error;

/// Errors raised while loading, validating, or replacing the approval config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Import text was not JSON, or did not have the Root Config shape.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The config parsed but failed one or more validation checks.
    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("failed to persist configuration: {0}")]
    Storage(#[from] StorageError),
}

impl ConfigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Durable storage failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine a storage directory")]
    NoHome,
}

/// Failures while executing an approval against the host page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("approval button not found (labels: {labels})")]
    NotFound { labels: String },

    #[error("element {node} is not clickable")]
    NotClickable { node: usize },

    #[error("click on element {node} failed: {reason}")]
    ClickFailed { node: usize, reason: String },
}
