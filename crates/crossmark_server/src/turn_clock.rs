//! Per-turn deadline.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Deadline for the active turn.
///
/// A deadline exists exactly while a turn is running: [`start`](Self::start)
/// replaces any earlier one and [`clear`](Self::clear) drops it when the match ends.
#[derive(Debug, Clone)]
pub struct TurnClock {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl TurnClock {
    /// Creates a stopped clock.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Time allowed per turn, in whole seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Starts a new turn at `now`, returning its deadline.
    #[instrument(skip(self))]
    pub fn start(&mut self, now: Instant) -> Instant {
        let deadline = now + self.timeout;
        self.deadline = Some(deadline);
        debug!(timeout_secs = self.timeout.as_secs(), "Turn clock started");
        deadline
    }

    /// Stops the clock.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Current deadline, if a turn is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the running turn's deadline has passed.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
