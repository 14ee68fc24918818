//! Wire protocol: one JSON object per frame, discriminated by `type`.
//!
//! Inbound payloads are decoded into [`ClientMessage`] at the session
//! boundary; anything that does not decode is dropped there and never
//! reaches the match logic.

use crate::seat_table::SeatTable;
use crate::session_log::{ChatEntry, EndReason, GameRecord, Outcome};
use crossmark_board::Seat;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Place the sender's marker at a cell index (0-8).
    Move {
        /// Cell index.
        position: usize,
    },
    /// The sender's local turn countdown ran out.
    TurnTimeout,
    /// The sender wants another match. `rematch` is the older name.
    #[serde(alias = "rematch")]
    RematchVote,
    /// A chat line.
    Chat {
        /// Text to relay.
        message: String,
    },
}

impl ClientMessage {
    /// Decodes one inbound frame.
    #[instrument(skip(payload), fields(len = payload.len()))]
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Events the session sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Seat assignment.
    Connect {
        /// Assigned seat.
        symbol: Seat,
        /// Human-readable greeting.
        message: String,
    },
    /// Rejection, e.g. room full.
    Error {
        /// Reason.
        message: String,
    },
    /// Both seats filled; the match begins.
    Start {
        /// Seat to move first.
        turn: Seat,
    },
    /// An accepted move.
    Move {
        /// Cell index.
        position: usize,
        /// Seat that moved.
        symbol: Seat,
    },
    /// The turn passed.
    Turn {
        /// Seat to move.
        turn: Seat,
        /// Seconds allowed for the move.
        timeout: u64,
    },
    /// The match ended.
    GameOver {
        /// Winning seat or `"draw"`.
        winner: Outcome,
        /// How it ended.
        reason: EndReason,
        /// Every result since this pairing began.
        #[serde(rename = "gameHistory")]
        game_history: Vec<GameRecord>,
    },
    /// The rematch window opened.
    RematchTimerStart {
        /// Seconds in the window.
        timeout: u64,
    },
    /// Current rematch votes.
    RematchVoteUpdate {
        /// Vote per seat.
        votes: SeatTable<bool>,
        /// Seconds left in the window, rounded up.
        #[serde(rename = "timeLeft")]
        time_left: u64,
    },
    /// The rematch window closed because both seats agreed.
    StopRematchTimer,
    /// A new match began after a rematch.
    Restart {
        /// Seat to move first.
        turn: Seat,
    },
    /// Sent to the seat that voted when its opponent was dropped.
    WaitingForNewPlayer {
        /// Notice text.
        message: String,
    },
    /// Sent to the seat that failed to vote, right before it is closed.
    TimeoutDisconnect {
        /// Notice text.
        message: String,
    },
    /// The opponent left.
    PlayerDisconnected {
        /// Notice text.
        message: String,
        /// Whether the board was reset.
        reset: bool,
    },
    /// A relayed chat line.
    Chat(ChatEntry),
}

impl ServerEvent {
    /// Encodes the event as one JSON frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Protocol error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Protocol error: {} at {}:{}", message, file, line)]
pub struct ProtocolError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// Creates a new protocol error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}
