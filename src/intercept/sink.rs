//! Hand-off from the interceptor to whoever processes calls.

use crate::policy::types::CallDescriptor;
use tokio::sync::mpsc;

/// Non-blocking dispatcher for observed calls.
///
/// Dispatch never waits on the consumer: the wrapped transport hands the
/// descriptor over and returns immediately.
#[derive(Debug, Clone)]
pub struct CallSink {
    tx: mpsc::UnboundedSender<CallDescriptor>,
}

impl CallSink {
    /// A sink and the receiving end the orchestrator reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CallDescriptor>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, call: CallDescriptor) {
        tracing::debug!("Observed MCP call: {}", call.summary());
        if self.tx.send(call).is_err() {
            tracing::debug!("No consumer for observed call, dropping it");
        }
    }
}
