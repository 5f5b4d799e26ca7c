//! Types shared by the feedback UI implementations.

use std::fmt;
use uuid::Uuid;

/// What the countdown overlay shows.
#[derive(Debug, Clone)]
pub struct CountdownRequest {
    /// The call this countdown belongs to
    pub call_id: Uuid,
    /// Seconds until the approval executes
    pub seconds: f64,
    /// One-line description of the call
    pub summary: String,
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}
