//! Orchestrator — drives each observed call from evaluation to execution.
//!
//! For every call:
//! 1. Stop if auto-approval is disabled
//! 2. Evaluate the rules; stop unless the decision approves
//! 3. Security gate: a delete needs a rule that explicitly lists delete
//! 4. Wait: a cancellable countdown if the rule wants confirmation,
//!    otherwise a silent delay
//! 5. Find and click the host's approval button
//! 6. Append an audit entry, and notify if the rule asks for it
//!
//! Nothing is retried. Failures are shown to the user and the call ends.

pub mod types;

pub use types::{Outcome, RunSummary, Stage};

use crate::approval::types::{CountdownRequest, NoticeLevel};
use crate::approval::{ControlLocator, ControlTarget, FeedbackUi, HostPage};
use crate::audit::{AuditEntry, AuditLog};
use crate::error::ControlError;
use crate::intercept::channel::CallSubscription;
use crate::policy::types::{ApprovalDecision, ApprovalRule, CallDescriptor, Operation};
use crate::policy::ConfigStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct Orchestrator {
    store: Arc<ConfigStore>,
    audit: Arc<AuditLog>,
    ui: Arc<dyn FeedbackUi>,
    page: Arc<dyn HostPage>,
    locator: ControlLocator,
    /// Accepted approval button labels
    labels: Vec<String>,
    /// Stage of every call still being handled
    stages: Mutex<HashMap<Uuid, Stage>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ConfigStore>,
        audit: Arc<AuditLog>,
        ui: Arc<dyn FeedbackUi>,
        page: Arc<dyn HostPage>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            store,
            audit,
            ui,
            page,
            locator: ControlLocator::default(),
            labels,
            stages: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_locator(mut self, locator: ControlLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn ui(&self) -> &Arc<dyn FeedbackUi> {
        &self.ui
    }

    /// The stage an in-flight call has reached. `None` once it has ended.
    pub fn stage_of(&self, id: Uuid) -> Option<Stage> {
        self.stages.lock().get(&id).copied()
    }

    /// Calls currently being handled.
    pub fn in_flight(&self) -> usize {
        self.stages.lock().len()
    }

    /// Run one call through every stage and report where it ended.
    pub async fn handle_call(&self, call: CallDescriptor) -> Outcome {
        tracing::debug!("Observed {} [{}]", call.summary(), call.id);
        let progress = InFlight::new(&self.stages, call.id);

        if !self.store.is_enabled() {
            tracing::debug!("Auto-approval disabled, ignoring {}", call.id);
            return Outcome::Disabled;
        }

        let decision = self.store.evaluate_approval_rules(&call);
        progress.advance(Stage::Evaluated);
        let rule = match (&decision.rule, decision.auto_approve) {
            (Some(rule), true) => rule.clone(),
            _ => {
                let reason = decision
                    .reason
                    .clone()
                    .unwrap_or_else(|| "not approved".to_string());
                tracing::info!("Not auto-approving {}: {}", call.summary(), reason);
                return Outcome::NotApproved { reason };
            }
        };

        if let Err(message) = security_gate(&call, &decision) {
            progress.advance(Stage::Skipped);
            tracing::warn!("{}", message);
            self.ui.show_notification(&message, NoticeLevel::Warning);
            return Outcome::BlockedByPolicy;
        }

        progress.advance(Stage::AwaitingConfirmation);
        if rule.require_confirmation {
            let request = CountdownRequest {
                call_id: call.id,
                seconds: decision.delay,
                summary: call.summary(),
            };
            if self.ui.show_countdown(&request).await {
                progress.advance(Stage::Cancelled);
                tracing::info!("Countdown cancelled for {}", call.summary());
                return Outcome::Cancelled;
            }
        } else {
            tokio::time::sleep(decision.delay_duration()).await;
        }

        if let Err(e) = self.execute(&call) {
            progress.advance(Stage::Skipped);
            self.ui
                .show_notification(&format!("Auto-approve failed: {}", e), NoticeLevel::Error);
            tracing::error!("Failed to execute approval for {}: {}", call.summary(), e);
            return match e {
                ControlError::NotFound { .. } => Outcome::ControlNotFound,
                other => Outcome::ClickFailed {
                    reason: other.to_string(),
                },
            };
        }

        progress.advance(Stage::Executed);
        self.log_execution(&call, &rule, decision.delay)
    }

    fn execute(&self, call: &CallDescriptor) -> Result<(), ControlError> {
        let target = ControlTarget::new(call.provider.clone(), &self.labels);
        let control = self
            .locator
            .find_approval_control(self.page.as_ref(), &target)
            .ok_or_else(|| ControlError::NotFound {
                labels: self.labels.join(", "),
            })?;
        control.click(self.page.as_ref())?;
        tracing::info!("Auto-approved {} (via {})", call.summary(), control.strategy);
        Ok(())
    }

    fn log_execution(&self, call: &CallDescriptor, rule: &ApprovalRule, delay: f64) -> Outcome {
        let entry = AuditEntry::executed(call, rule, delay);
        let logged = match self.audit.append(entry.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write audit entry: {}", e);
                false
            }
        };

        if rule.notify_on_approval {
            self.ui.show_notification(
                &format!("Auto-approved: {}", call.summary()),
                NoticeLevel::Success,
            );
        }

        Outcome::Executed { entry, logged }
    }

    /// Handle calls from the interceptors and, optionally, the broadcast
    /// channel until both inputs close or `shutdown` fires.
    ///
    /// Each call runs in its own task, so a call waiting on its countdown
    /// never holds up the ones behind it. Finished tasks are reaped as the
    /// loop goes; the summary keeps counts plus the most recent outcomes.
    pub async fn run(
        self: Arc<Self>,
        mut calls: mpsc::UnboundedReceiver<CallDescriptor>,
        mut broadcast: Option<CallSubscription>,
        shutdown: CancellationToken,
    ) -> RunSummary {
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut calls_open = true;

        while calls_open || broadcast.is_some() {
            let call = tokio::select! {
                _ = shutdown.cancelled() => break,
                call = calls.recv(), if calls_open => match call {
                    Some(call) => call,
                    None => {
                        calls_open = false;
                        continue;
                    }
                },
                call = next_broadcast(&mut broadcast), if broadcast.is_some() => match call {
                    Some(call) => call,
                    None => {
                        broadcast = None;
                        continue;
                    }
                },
            };

            let this = self.clone();
            tasks.spawn(async move { this.handle_call(call).await });

            while let Some(result) = tasks.try_join_next() {
                reap(&mut summary, result);
            }
        }

        while let Some(result) = tasks.join_next().await {
            reap(&mut summary, result);
        }
        summary
    }
}

fn reap(summary: &mut RunSummary, result: Result<Outcome, tokio::task::JoinError>) {
    match result {
        Ok(outcome) => {
            tracing::debug!("Call finished: {}", outcome);
            summary.record(outcome);
        }
        Err(e) => tracing::error!("Call task failed: {}", e),
    }
}

/// Tracks a call's stage while it is handled and forgets it when the call
/// ends, including when its task is aborted.
struct InFlight<'a> {
    stages: &'a Mutex<HashMap<Uuid, Stage>>,
    id: Uuid,
}

impl<'a> InFlight<'a> {
    fn new(stages: &'a Mutex<HashMap<Uuid, Stage>>, id: Uuid) -> Self {
        stages.lock().insert(id, Stage::Observed);
        Self { stages, id }
    }

    fn advance(&self, stage: Stage) {
        tracing::trace!("{} -> {}", self.id, stage);
        self.stages.lock().insert(self.id, stage);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stages.lock().remove(&self.id);
    }
}

async fn next_broadcast(subscription: &mut Option<CallSubscription>) -> Option<CallDescriptor> {
    match subscription {
        Some(sub) => sub.recv().await,
        None => None,
    }
}

/// A delete may only proceed when the matched rule lists delete itself,
/// whatever the matcher decided.
pub fn security_gate(call: &CallDescriptor, decision: &ApprovalDecision) -> Result<(), String> {
    if call.operation != Operation::Delete {
        return Ok(());
    }
    match decision.rule {
        Some(ref rule) if rule.allows(Operation::Delete) => Ok(()),
        _ => Err(format!(
            "Blocked by policy: {} is a delete and its rule does not allow delete",
            call.summary()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(ops: &[Operation]) -> ApprovalRule {
        ApprovalRule {
            repo_pattern: "*".to_string(),
            operations: ops.to_vec(),
            path_patterns: None,
            auto_approve: true,
            delay: Some(0.0),
            require_confirmation: false,
            notify_on_approval: false,
        }
    }

    #[test]
    fn test_gate_blocks_delete_without_explicit_rule() {
        let call = CallDescriptor::new("github", Operation::Delete);
        let decision = ApprovalDecision::matched(&rule(&[Operation::Create]), 0.0);
        assert!(security_gate(&call, &decision).is_err());
    }

    #[test]
    fn test_gate_allows_explicit_delete() {
        let call = CallDescriptor::new("github", Operation::Delete);
        let decision = ApprovalDecision::matched(&rule(&[Operation::Delete]), 0.0);
        assert!(security_gate(&call, &decision).is_ok());
    }

    #[test]
    fn test_gate_ignores_other_operations() {
        let call = CallDescriptor::new("github", Operation::Update);
        let decision = ApprovalDecision::matched(&rule(&[Operation::Create]), 0.0);
        assert!(security_gate(&call, &decision).is_ok());
    }

    #[test]
    fn test_outcome_stages() {
        assert_eq!(Outcome::Disabled.stage(), Stage::Observed);
        assert_eq!(Outcome::Cancelled.stage(), Stage::Cancelled);
        assert_eq!(
            Outcome::NotApproved {
                reason: "x".to_string()
            }
            .stage(),
            Stage::Evaluated
        );
    }
}
