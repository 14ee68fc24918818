//! The session worker task.
//!
//! A single task owns the [`MatchSession`]. Connections talk to it through a
//! [`SessionHandle`]; each command runs to completion before the next one is
//! read, so the session never needs a lock. Outbound events go to per-connection
//! channels registered at connect time.

use crate::config::{SessionConfig, TimerMode};
use crate::connection::ConnectionId;
use crate::protocol::{ClientMessage, ServerEvent};
use crate::session::MatchSession;
use crate::sink::EventSink;
use crate::timer::DeadlineTimer;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// A frame queued for one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// An event to write.
    Event(ServerEvent),
    /// Close the socket after everything queued before it.
    Close,
}

/// Sending half of a connection's outbound queue.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// Work for the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// A connection opened.
    Connect {
        /// New connection.
        conn: ConnectionId,
        /// Where its events go.
        outbox: Outbox,
    },
    /// A text frame arrived.
    Message {
        /// Sender.
        conn: ConnectionId,
        /// Raw frame text.
        payload: String,
    },
    /// A connection closed.
    Disconnect {
        /// Closed connection.
        conn: ConnectionId,
    },
}

/// The session task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Session task is no longer running")]
pub struct SessionClosed;

/// Cloneable handle to a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    next_id: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Spawns the session task on the current runtime.
    #[instrument]
    pub fn spawn(config: SessionConfig) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(MatchSession::new(config), rx));
        info!("Session task spawned");
        (
            Self {
                commands,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            task,
        )
    }

    /// Allocates a fresh connection identity.
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::from(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a connection and its outbound queue.
    pub fn connect(&self, conn: ConnectionId, outbox: Outbox) -> Result<(), SessionClosed> {
        self.submit(SessionCommand::Connect { conn, outbox })
    }

    /// Forwards a text frame.
    pub fn message(&self, conn: ConnectionId, payload: impl Into<String>) -> Result<(), SessionClosed> {
        self.submit(SessionCommand::Message {
            conn,
            payload: payload.into(),
        })
    }

    /// Reports a closed connection.
    pub fn disconnect(&self, conn: ConnectionId) -> Result<(), SessionClosed> {
        self.submit(SessionCommand::Disconnect { conn })
    }

    fn submit(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }
}

/// Outbound queues of live connections.
#[derive(Debug, Default)]
struct ConnectionRegistry {
    outboxes: HashMap<ConnectionId, Outbox>,
}

impl ConnectionRegistry {
    fn register(&mut self, conn: ConnectionId, outbox: Outbox) {
        self.outboxes.insert(conn, outbox);
    }

    fn remove(&mut self, conn: ConnectionId) {
        self.outboxes.remove(&conn);
    }
}

impl EventSink for ConnectionRegistry {
    fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        match self.outboxes.get(&to) {
            Some(outbox) => {
                if outbox.send(Outbound::Event(event)).is_err() {
                    debug!(conn = %to, "Outbox closed; dropping event");
                }
            }
            None => trace!(conn = %to, "No outbox for connection"),
        }
    }

    fn close(&mut self, conn: ConnectionId) {
        if let Some(outbox) = self.outboxes.remove(&conn) {
            // The writer may already be gone.
            let _ = outbox.send(Outbound::Close);
        }
    }
}

/// What woke the worker.
enum Wake {
    Command(SessionCommand),
    Deadline(Instant),
}

async fn run_session(mut session: MatchSession, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
    let mut registry = ConnectionRegistry::default();
    let mut timer = DeadlineTimer::new();
    let mode = *session.config().timer_mode();
    info!(%mode, "Session worker running");

    loop {
        let wake = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => Wake::Command(command),
                None => break,
            },
            deadline = timer.fired() => Wake::Deadline(deadline),
        };

        let now = Instant::now();
        match wake {
            Wake::Command(SessionCommand::Connect { conn, outbox }) => {
                registry.register(conn, outbox);
                session.handle_connect(conn, now, &mut registry);
            }
            Wake::Command(SessionCommand::Message { conn, payload }) => {
                match ClientMessage::decode(&payload) {
                    Ok(message) => session.handle_message(conn, message, now, &mut registry),
                    Err(e) => {
                        debug!(%conn, error = %e, "Ignoring malformed frame");
                        session.expire_deadlines(now, &mut registry);
                    }
                }
            }
            Wake::Command(SessionCommand::Disconnect { conn }) => {
                session.handle_disconnect(conn, &mut registry);
                registry.remove(conn);
            }
            Wake::Deadline(deadline) => {
                debug!(?deadline, "Deadline fired");
                session.expire_deadlines(now, &mut registry);
            }
        }

        if mode == TimerMode::Proactive {
            timer.sync(session.next_deadline());
        }
    }

    warn!("All session handles dropped; worker exiting");
}
