//! Rematch voting after a match ends.
//!
//! The first vote opens a fixed window. If the other seat votes inside it,
//! both agree and a new match starts. If the window runs out first, the seat
//! that opened it is kept and marked as waiting, and the silent seat is
//! dropped so a newcomer can take its place.

use crate::connection::ConnectionId;
use crate::seat_table::SeatTable;
use crossmark_board::Seat;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Smallest step past the window end; the window only counts as exceeded after it.
const PAST_WINDOW: Duration = Duration::from_millis(1);

/// An open vote window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VoteWindow {
    opened_by: Seat,
    started: Instant,
}

/// What a vote led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteVerdict {
    /// Still waiting on the other seat.
    Pending {
        /// Votes so far.
        votes: SeatTable<bool>,
        /// Time left in the window.
        time_left: Duration,
    },
    /// Both seats voted inside the window. Votes and window are cleared.
    Agreed {
        /// Final votes.
        votes: SeatTable<bool>,
        /// Time that was left in the window.
        time_left: Duration,
    },
    /// The window had already run out when this vote arrived.
    Expired {
        /// Seat whose vote opened the window.
        voter: Seat,
    },
}

/// Result of [`RematchNegotiator::cast_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// This vote opened the window.
    pub window_opened: bool,
    /// Where the vote left the negotiation.
    pub verdict: VoteVerdict,
}

/// Per-match rematch state plus the pending backfill marker.
#[derive(Debug, Clone)]
pub struct RematchNegotiator {
    window: Duration,
    votes: SeatTable<bool>,
    open: Option<VoteWindow>,
    last_voter: Option<ConnectionId>,
    waiting_seat: Option<Seat>,
}

impl RematchNegotiator {
    /// Creates a negotiator with no votes.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            votes: SeatTable::default(),
            open: None,
            last_voter: None,
            waiting_seat: None,
        }
    }

    /// Length of the vote window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Votes so far.
    pub fn votes(&self) -> SeatTable<bool> {
        self.votes
    }

    /// Connection that voted last.
    pub fn last_voter(&self) -> Option<ConnectionId> {
        self.last_voter
    }

    /// Whether a vote window is running.
    pub fn is_window_open(&self) -> bool {
        self.open.is_some()
    }

    /// Seat kept after a timed-out negotiation, waiting for a new opponent.
    pub fn waiting_seat(&self) -> Option<Seat> {
        self.waiting_seat
    }

    /// Seat a newcomer should be bound to, if a backfill is pending.
    pub fn backfill_seat(&self) -> Option<Seat> {
        self.waiting_seat.map(Seat::opponent)
    }

    /// Records a vote from `seat` at `now`.
    #[instrument(skip(self))]
    pub fn cast_vote(&mut self, seat: Seat, conn: ConnectionId, now: Instant) -> VoteOutcome {
        self.votes.set(seat, true);
        self.last_voter = Some(conn);

        let window_opened = self.open.is_none();
        let window = *self.open.get_or_insert(VoteWindow {
            opened_by: seat,
            started: now,
        });
        if window_opened {
            info!(%seat, window_secs = self.window.as_secs(), "Rematch window opened");
        }

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed > self.window {
            debug!(%seat, ?elapsed, "Vote arrived after the window closed");
            return VoteOutcome {
                window_opened,
                verdict: VoteVerdict::Expired {
                    voter: window.opened_by,
                },
            };
        }

        let votes = self.votes;
        let time_left = self.window - elapsed;
        let verdict = if *votes.x() && *votes.o() {
            info!("Both seats agreed to a rematch");
            self.clear_votes();
            VoteVerdict::Agreed { votes, time_left }
        } else {
            VoteVerdict::Pending { votes, time_left }
        };

        VoteOutcome {
            window_opened,
            verdict,
        }
    }

    /// Seat that opened the window, once the window has been exceeded.
    pub fn expired_voter(&self, now: Instant) -> Option<Seat> {
        self.open
            .filter(|window| now.saturating_duration_since(window.started) > self.window)
            .map(|window| window.opened_by)
    }

    /// First instant at which the open window counts as exceeded.
    pub fn deadline(&self) -> Option<Instant> {
        self.open
            .map(|window| window.started + self.window + PAST_WINDOW)
    }

    /// Closes an expired window: the opener becomes the waiting seat.
    ///
    /// Returns the waiting seat, or `None` if no window was open.
    #[instrument(skip(self))]
    pub fn resolve_timeout(&mut self) -> Option<Seat> {
        let voter = self.open?.opened_by;
        self.clear_votes();
        self.waiting_seat = Some(voter);
        info!(waiting = %voter, "Rematch window expired");
        Some(voter)
    }

    /// Drops the pending backfill marker.
    pub fn clear_waiting(&mut self) {
        self.waiting_seat = None;
    }

    /// Drops votes, window and last voter; keeps the backfill marker.
    pub fn clear_votes(&mut self) {
        self.votes = SeatTable::default();
        self.open = None;
        self.last_voter = None;
    }

    /// Drops everything.
    pub fn reset(&mut self) {
        self.clear_votes();
        self.clear_waiting();
    }
}
