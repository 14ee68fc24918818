//! Crossmark server - two-seat match sessions over WebSocket.
//!
//! # Architecture
//!
//! - **Session**: [`MatchSession`], a synchronous controller that owns seats,
//!   the match, the turn clock, rematch votes and the session log
//! - **Worker**: [`SessionHandle`] feeds connection events to the session on
//!   one task and arms a [`DeadlineTimer`] for the next turn or rematch deadline
//! - **Transport**: axum WebSocket routes that bridge sockets to the worker
//!
//! # Example
//!
//! ```
//! use crossmark_server::{ClientMessage, ConnectionId, MatchSession, RecordingSink, SessionConfig};
//! use tokio::time::Instant;
//!
//! let mut session = MatchSession::new(SessionConfig::default());
//! let mut sink = RecordingSink::new();
//! let now = Instant::now();
//!
//! session.handle_connect(ConnectionId::from(1), now, &mut sink);
//! session.handle_connect(ConnectionId::from(2), now, &mut sink);
//! session.handle_message(ConnectionId::from(1), ClientMessage::Move { position: 4 }, now, &mut sink);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod actor;
mod config;
mod connection;
mod match_state;
mod protocol;
mod rematch;
mod seat_table;
mod seats;
mod session;
mod session_log;
mod sink;
mod timer;
mod transport;
mod turn_clock;

// Crate-level exports - Configuration
pub use config::{
    ClientTimeoutPolicy, ConfigError, MAX_TIMEOUT_SECS, ServerConfig, SessionConfig, TimerMode,
};

// Crate-level exports - Session core
pub use connection::ConnectionId;
pub use match_state::{AcceptedMove, MatchPhase, MatchState, MoveRejection};
pub use rematch::{RematchNegotiator, VoteOutcome, VoteVerdict};
pub use seat_table::SeatTable;
pub use seats::{SeatAllocator, SeatError};
pub use session::MatchSession;
pub use session_log::{ChatEntry, EndReason, GameRecord, Outcome, SessionLog};
pub use turn_clock::TurnClock;

// Crate-level exports - Wire protocol and effects
pub use protocol::{ClientMessage, ProtocolError, ServerEvent};
pub use sink::{Effect, EventSink, RecordingSink};

// Crate-level exports - Runtime
pub use actor::{Outbound, Outbox, SessionClosed, SessionCommand, SessionHandle};
pub use timer::DeadlineTimer;
pub use transport::{router, serve};
