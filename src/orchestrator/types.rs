//! Per-call stages and final outcomes.

use crate::audit::AuditEntry;
use std::collections::VecDeque;
use std::fmt;

/// How many finished outcomes a `RunSummary` keeps.
pub const RECENT_OUTCOMES: usize = 50;

/// Where a call is in its lifecycle.
///
/// `Observed → Evaluated → (Skipped | AwaitingConfirmation → Cancelled) →
/// (Skipped | Executed) → Logged`
///
/// `AwaitingConfirmation` is only ever transient: it shows up in
/// `Orchestrator::stage_of` while a call waits, never as a final stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Observed,
    Evaluated,
    AwaitingConfirmation,
    Cancelled,
    Skipped,
    Executed,
    Logged,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Observed => "observed",
            Stage::Evaluated => "evaluated",
            Stage::AwaitingConfirmation => "awaiting-confirmation",
            Stage::Cancelled => "cancelled",
            Stage::Skipped => "skipped",
            Stage::Executed => "executed",
            Stage::Logged => "logged",
        };
        write!(f, "{}", s)
    }
}

/// How a call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Auto-approval is switched off globally
    Disabled,
    /// No rule approves this call; it is left for the user
    NotApproved { reason: String },
    /// A delete reached execution without its rule authorizing delete
    BlockedByPolicy,
    /// The user cancelled the countdown
    Cancelled,
    /// The approval button could not be located
    ControlNotFound,
    /// The approval button was found but clicking it failed
    ClickFailed { reason: String },
    /// Approved and clicked. `logged` is false if the audit write failed.
    Executed { entry: AuditEntry, logged: bool },
}

impl Outcome {
    /// The last stage the call reached.
    pub fn stage(&self) -> Stage {
        match self {
            Outcome::Disabled => Stage::Observed,
            Outcome::NotApproved { .. } => Stage::Evaluated,
            Outcome::BlockedByPolicy | Outcome::ControlNotFound | Outcome::ClickFailed { .. } => {
                Stage::Skipped
            }
            Outcome::Cancelled => Stage::Cancelled,
            Outcome::Executed { logged: true, .. } => Stage::Logged,
            Outcome::Executed { logged: false, .. } => Stage::Executed,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Disabled => write!(f, "auto-approval disabled"),
            Outcome::NotApproved { reason } => write!(f, "not approved ({})", reason),
            Outcome::BlockedByPolicy => write!(f, "blocked by policy"),
            Outcome::Cancelled => write!(f, "cancelled"),
            Outcome::ControlNotFound => write!(f, "approval button not found"),
            Outcome::ClickFailed { reason } => write!(f, "click failed ({})", reason),
            Outcome::Executed { logged, .. } => {
                if *logged {
                    write!(f, "approved")
                } else {
                    write!(f, "approved (audit write failed)")
                }
            }
        }
    }
}

/// What a `run` loop handled: totals plus the last few outcomes.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub handled: usize,
    pub executed: usize,
    pub recent: VecDeque<Outcome>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: Outcome) {
        self.handled += 1;
        if outcome.is_executed() {
            self.executed += 1;
        }
        if self.recent.len() == RECENT_OUTCOMES {
            self.recent.pop_front();
        }
        self.recent.push_back(outcome);
    }
}
