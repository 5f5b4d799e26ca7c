//! Cancellable countdowns.
//!
//! Overlapping confirmations are queued: only one countdown runs at a time,
//! in arrival order, and the others wait their turn. Every countdown gets its
//! own ticket with its own cancellation token, so cancelling always hits the
//! intended countdown even if two calls arrive carrying the same id:
//! `cancel(id)` works whether the call is running or still queued, and
//! `cancel_active` hits only the countdown currently on screen.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Elapsed,
    Cancelled,
}

impl CountdownOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CountdownOutcome::Cancelled)
    }
}

/// One queued countdown.
#[derive(Debug, Clone)]
pub struct Ticket {
    seq: u64,
    call_id: Uuid,
    token: CancellationToken,
}

impl Ticket {
    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
pub struct Countdowns {
    turn: tokio::sync::Mutex<()>,
    next_seq: AtomicU64,
    tickets: Mutex<HashMap<u64, Ticket>>,
    active: Mutex<Option<u64>>,
}

impl Countdowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `call_id`. Taking the ticket before `run_ticket`
    /// lets a caller watch or cancel a countdown that is still queued.
    pub fn enqueue(&self, call_id: Uuid) -> Ticket {
        let ticket = Ticket {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            call_id,
            token: CancellationToken::new(),
        };
        self.tickets.lock().insert(ticket.seq, ticket.clone());
        ticket
    }

    /// Issue a ticket for `call_id` and count it down.
    pub async fn run(&self, call_id: Uuid, duration: Duration) -> CountdownOutcome {
        let ticket = self.enqueue(call_id);
        self.run_ticket(&ticket, duration).await
    }

    /// Wait for this ticket's turn, then count down `duration`. Resolves early
    /// with `Cancelled` if the ticket is cancelled while queued or running.
    pub async fn run_ticket(&self, ticket: &Ticket, duration: Duration) -> CountdownOutcome {
        let _slot = Slot {
            owner: self,
            seq: ticket.seq,
        };

        let _turn = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => return CountdownOutcome::Cancelled,
            turn = self.turn.lock() => turn,
        };

        *self.active.lock() = Some(ticket.seq);
        tracing::debug!("Countdown {} started ({:?})", ticket.call_id, duration);

        tokio::select! {
            biased;
            _ = ticket.token.cancelled() => CountdownOutcome::Cancelled,
            _ = tokio::time::sleep(duration) => CountdownOutcome::Elapsed,
        }
    }

    /// Cancel every countdown for a call. Returns false if none is pending.
    pub fn cancel(&self, call_id: Uuid) -> bool {
        let mut found = false;
        for ticket in self.tickets.lock().values() {
            if ticket.call_id == call_id {
                ticket.token.cancel();
                found = true;
            }
        }
        if found {
            tracing::info!("Countdown {} cancelled", call_id);
        }
        found
    }

    /// Cancel whichever countdown is currently running.
    pub fn cancel_active(&self) -> bool {
        let Some(seq) = *self.active.lock() else {
            return false;
        };
        match self.tickets.lock().get(&seq) {
            Some(ticket) => {
                ticket.token.cancel();
                tracing::info!("Countdown {} cancelled", ticket.call_id);
                true
            }
            None => false,
        }
    }

    /// The call whose countdown is running, if any.
    pub fn active(&self) -> Option<Uuid> {
        let seq = (*self.active.lock())?;
        self.tickets.lock().get(&seq).map(|t| t.call_id)
    }

    /// Whether `ticket` is the one currently counting down.
    pub fn is_active(&self, ticket: &Ticket) -> bool {
        *self.active.lock() == Some(ticket.seq)
    }

    /// Countdowns running or queued.
    pub fn pending(&self) -> usize {
        self.tickets.lock().len()
    }
}

/// Removes a ticket's bookkeeping however its countdown ends, including when
/// the future is dropped mid-wait.
struct Slot<'a> {
    owner: &'a Countdowns,
    seq: u64,
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.owner.tickets.lock().remove(&self.seq);
        let mut active = self.owner.active.lock();
        if *active == Some(self.seq) {
            *active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_elapses() {
        let countdowns = Countdowns::new();
        let outcome = countdowns.run(Uuid::new_v4(), Duration::from_secs(2)).await;
        assert_eq!(outcome, CountdownOutcome::Elapsed);
        assert_eq!(countdowns.pending(), 0);
        assert_eq!(countdowns.active(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_active() {
        let countdowns = Arc::new(Countdowns::new());
        let id = Uuid::new_v4();

        let runner = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(id, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(countdowns.active(), Some(id));
        assert!(countdowns.cancel_active());

        assert_eq!(runner.await.unwrap(), CountdownOutcome::Cancelled);
        assert!(!countdowns.cancel_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_countdowns_queue_and_cancel_the_right_call() {
        let countdowns = Arc::new(Countdowns::new());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let a = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(first, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let b = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(second, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The first call is on screen; the second is queued behind it.
        assert_eq!(countdowns.active(), Some(first));
        assert_eq!(countdowns.pending(), 2);

        // Cancelling the active countdown must not touch the queued one.
        assert!(countdowns.cancel_active());
        assert_eq!(a.await.unwrap(), CountdownOutcome::Cancelled);
        assert_eq!(b.await.unwrap(), CountdownOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_queued() {
        let countdowns = Arc::new(Countdowns::new());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let a = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(first, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let ticket = countdowns.enqueue(second);
        let b = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run_ticket(&ticket, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(countdowns.cancel(second));
        assert_eq!(b.await.unwrap(), CountdownOutcome::Cancelled);
        assert_eq!(a.await.unwrap(), CountdownOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_call_id_cancels_only_the_active_countdown() {
        let countdowns = Arc::new(Countdowns::new());
        let id = Uuid::new_v4();

        let a = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(id, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let b = {
            let c = countdowns.clone();
            tokio::spawn(async move { c.run(id, Duration::from_secs(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(countdowns.pending(), 2);

        assert!(countdowns.cancel_active());
        assert_eq!(a.await.unwrap(), CountdownOutcome::Cancelled);
        assert_eq!(b.await.unwrap(), CountdownOutcome::Elapsed);
        assert_eq!(countdowns.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticket_reports_active() {
        let countdowns = Arc::new(Countdowns::new());
        let ticket = countdowns.enqueue(Uuid::new_v4());
        assert!(!countdowns.is_active(&ticket));

        let runner = {
            let c = countdowns.clone();
            let t = ticket.clone();
            tokio::spawn(async move { c.run_ticket(&t, Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(countdowns.is_active(&ticket));
        assert_eq!(countdowns.active(), Some(ticket.call_id()));

        assert_eq!(runner.await.unwrap(), CountdownOutcome::Elapsed);
        assert!(!countdowns.is_active(&ticket));
    }
}
