//! Single-shot deadline timer for the session worker.

use std::future;
use tokio::time::{self, Instant};
use tracing::trace;

/// One pending wake-up.
///
/// Holds at most one deadline. Rescheduling replaces it, so a stale turn
/// or rematch deadline can never fire after the state it belonged to is gone.
#[derive(Debug, Clone, Default)]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `deadline`, replacing any earlier one.
    pub fn schedule(&mut self, deadline: Instant) {
        trace!(?deadline, "Timer armed");
        self.deadline = Some(deadline);
    }

    /// Disarms the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Arms or disarms to match `deadline`.
    pub fn sync(&mut self, deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => self.schedule(deadline),
            None => self.cancel(),
        }
    }

    /// Pending deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits for the pending deadline, then disarms.
    ///
    /// Never completes while disarmed. Cancel-safe: dropping the future
    /// leaves the deadline in place.
    pub async fn fired(&mut self) -> Instant {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
                deadline
            }
            None => future::pending().await,
        }
    }
}
