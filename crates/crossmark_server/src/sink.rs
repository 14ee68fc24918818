//! Outbound effects of the match session.

use crate::connection::ConnectionId;
use crate::protocol::ServerEvent;

/// Delivers events to connections and closes them.
///
/// The session never talks to sockets directly; every effect goes through
/// this trait, so the transport decides how and when frames are written.
pub trait EventSink {
    /// Queues an event for one connection.
    fn send(&mut self, to: ConnectionId, event: ServerEvent);

    /// Closes a connection after any queued events.
    fn close(&mut self, conn: ConnectionId);
}

/// One recorded effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// An event sent to a connection.
    Send(ConnectionId, ServerEvent),
    /// A connection closed by the session.
    Close(ConnectionId),
}

/// Sink that records effects in order instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    effects: Vec<Effect>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All effects so far, in order.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Drains the recorded effects.
    pub fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Events sent to one connection, in order.
    pub fn events_for(&self, conn: ConnectionId) -> Vec<ServerEvent> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Send(to, event) if *to == conn => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Connections closed so far.
    pub fn closed(&self) -> Vec<ConnectionId> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Close(conn) => Some(*conn),
                Effect::Send(..) => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        self.effects.push(Effect::Send(to, event));
    }

    fn close(&mut self, conn: ConnectionId) {
        self.effects.push(Effect::Close(conn));
    }
}
