//! The match session controller.
//!
//! One [`MatchSession`] is the whole shared record for a table: seats, the
//! match, the turn clock, rematch votes and the session log. Transport events
//! are fed in one at a time and every effect goes out through an
//! [`EventSink`]. Nothing in here blocks or spawns; the caller supplies `now`.

use crate::config::{ClientTimeoutPolicy, SessionConfig};
use crate::connection::ConnectionId;
use crate::match_state::{MatchPhase, MatchState};
use crate::protocol::{ClientMessage, ServerEvent};
use crate::rematch::{RematchNegotiator, VoteVerdict};
use crate::seats::{SeatAllocator, SeatError};
use crate::session_log::{EndReason, Outcome, SessionLog};
use crate::sink::EventSink;
use crate::turn_clock::TurnClock;
use crossmark_board::{GameStatus, Seat};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A single two-seat table.
#[derive(Debug, Clone)]
pub struct MatchSession {
    config: SessionConfig,
    seats: SeatAllocator,
    game: MatchState,
    clock: TurnClock,
    rematch: RematchNegotiator,
    log: SessionLog,
}

impl MatchSession {
    /// Creates an empty table.
    #[instrument]
    pub fn new(config: SessionConfig) -> Self {
        info!("Creating match session");
        Self {
            seats: SeatAllocator::new(),
            game: MatchState::new(),
            clock: TurnClock::new(config.turn_timeout()),
            rematch: RematchNegotiator::new(config.rematch_window()),
            log: SessionLog::new(*config.max_chat_len()),
            config,
        }
    }

    /// Session rules.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Seat occupancy.
    pub fn seats(&self) -> &SeatAllocator {
        &self.seats
    }

    /// The match.
    pub fn match_state(&self) -> &MatchState {
        &self.game
    }

    /// The turn clock.
    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    /// Rematch votes and backfill marker.
    pub fn rematch(&self) -> &RematchNegotiator {
        &self.rematch
    }

    /// Chat and result history.
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Earliest instant at which [`expire_deadlines`](Self::expire_deadlines) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let turn = match self.game.phase() {
            MatchPhase::InProgress => self.clock.deadline(),
            _ => None,
        };
        match (turn, self.rematch.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Transport events
    // ─────────────────────────────────────────────────────────────

    /// A connection opened.
    ///
    /// Elapsed deadlines are resolved first, so a seat freed by an exceeded
    /// rematch window is available to this connection.
    #[instrument(skip(self, sink))]
    pub fn handle_connect(&mut self, conn: ConnectionId, now: Instant, sink: &mut impl EventSink) {
        self.expire_deadlines(now, sink);

        let backfill = self.rematch.backfill_seat();
        let seat = match self.seats.assign(conn, backfill) {
            Ok(seat) => seat,
            Err(SeatError::RoomFull) => {
                warn!(%conn, "Rejecting connection: room full");
                sink.send(
                    conn,
                    ServerEvent::Error {
                        message: SeatError::RoomFull.to_string(),
                    },
                );
                sink.close(conn);
                return;
            }
            Err(SeatError::AlreadySeated(seat)) => {
                debug!(%conn, %seat, "Duplicate connect ignored");
                return;
            }
        };

        if backfill == Some(seat) {
            info!(%conn, %seat, "Backfilled seat vacated by rematch timeout");
            self.rematch.clear_waiting();
        }

        sink.send(
            conn,
            ServerEvent::Connect {
                symbol: seat,
                message: format!("You are player {}", seat),
            },
        );
        for entry in self.log.chat() {
            sink.send(conn, ServerEvent::Chat(entry.clone()));
        }

        if self.seats.is_full() {
            let turn = self.begin_match(now);
            self.broadcast(sink, ServerEvent::Start { turn });
        }
    }

    /// A connection closed.
    #[instrument(skip(self, sink))]
    pub fn handle_disconnect(&mut self, conn: ConnectionId, sink: &mut impl EventSink) {
        let Some(seat) = self.seats.release(conn) else {
            debug!(%conn, "Unseated connection closed");
            return;
        };

        self.log.clear();
        self.game.reset();
        self.clock.clear();
        self.rematch.reset();

        info!(%conn, %seat, "Player left; table reset");
        self.broadcast(
            sink,
            ServerEvent::PlayerDisconnected {
                message: format!("Player {} disconnected", seat),
                reset: true,
            },
        );
    }

    /// A decoded message arrived.
    ///
    /// Elapsed deadlines are resolved first, so a late message always sees
    /// the state the timeout left behind.
    #[instrument(skip(self, sink))]
    pub fn handle_message(
        &mut self,
        conn: ConnectionId,
        message: ClientMessage,
        now: Instant,
        sink: &mut impl EventSink,
    ) {
        self.expire_deadlines(now, sink);

        let Some(seat) = self.seats.seat_of(conn) else {
            debug!(%conn, "Ignoring message from unseated connection");
            return;
        };

        match message {
            ClientMessage::Move { position } => self.apply_move(seat, position, now, sink),
            ClientMessage::TurnTimeout => self.turn_timeout_signal(seat, sink),
            ClientMessage::RematchVote => self.cast_vote(seat, conn, now, sink),
            ClientMessage::Chat { message } => self.append_chat(seat, &message, sink),
        }
    }

    /// Resolves every deadline that has passed by `now`.
    ///
    /// An elapsed turn forfeits the active seat; an exceeded rematch window
    /// drops the seat that did not vote.
    #[instrument(skip(self, sink))]
    pub fn expire_deadlines(&mut self, now: Instant, sink: &mut impl EventSink) {
        if self.game.phase() == MatchPhase::InProgress && self.clock.is_expired(now) {
            info!(seat = %self.game.active_seat(), "Turn deadline passed");
            self.forfeit_turn(sink);
        }
        if self.rematch.expired_voter(now).is_some() {
            self.resolve_rematch_timeout(sink);
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Match
    // ─────────────────────────────────────────────────────────────

    fn apply_move(&mut self, seat: Seat, position: usize, now: Instant, sink: &mut impl EventSink) {
        let accepted = match self.game.apply_move(seat, position) {
            Ok(accepted) => accepted,
            Err(rejection) => {
                debug!(%seat, position, %rejection, "Ignoring move");
                return;
            }
        };

        self.broadcast(
            sink,
            ServerEvent::Move {
                position: accepted.position.to_index(),
                symbol: seat,
            },
        );

        match accepted.status {
            GameStatus::Won(winner) => self.finish(Outcome::Winner(winner), EndReason::Normal, sink),
            GameStatus::Draw => self.finish(Outcome::Draw, EndReason::Normal, sink),
            GameStatus::InProgress => {
                self.clock.start(now);
                let turn = self.game.active_seat();
                self.broadcast(
                    sink,
                    ServerEvent::Turn {
                        turn,
                        timeout: self.clock.timeout_secs(),
                    },
                );
            }
        }
    }

    fn turn_timeout_signal(&mut self, seat: Seat, sink: &mut impl EventSink) {
        if self.game.phase() != MatchPhase::InProgress {
            debug!(%seat, "Turn timeout report outside a match");
            return;
        }
        match *self.config.client_timeout() {
            ClientTimeoutPolicy::Trusted => {
                info!(%seat, "Client reported turn timeout");
                self.forfeit_turn(sink);
            }
            ClientTimeoutPolicy::Advisory => {
                debug!(%seat, "Turn timeout report is advisory; deadline not yet reached");
            }
        }
    }

    fn forfeit_turn(&mut self, sink: &mut impl EventSink) {
        if let Some(loser) = self.game.forfeit() {
            self.finish(Outcome::Winner(loser.opponent()), EndReason::Timeout, sink);
        }
    }

    fn finish(&mut self, winner: Outcome, reason: EndReason, sink: &mut impl EventSink) {
        self.clock.clear();
        self.rematch.clear_votes();
        let game_history = self.log.append_result(winner, reason).to_vec();
        info!(%winner, %reason, matches = game_history.len(), "Match over");
        self.broadcast(
            sink,
            ServerEvent::GameOver {
                winner,
                reason,
                game_history,
            },
        );
    }

    fn begin_match(&mut self, now: Instant) -> Seat {
        self.rematch.clear_votes();
        let turn = self.game.begin();
        self.clock.start(now);
        turn
    }

    // ─────────────────────────────────────────────────────────────
    //  Rematch
    // ─────────────────────────────────────────────────────────────

    fn cast_vote(&mut self, seat: Seat, conn: ConnectionId, now: Instant, sink: &mut impl EventSink) {
        if self.game.phase() != MatchPhase::Terminal || !self.seats.is_full() {
            debug!(%seat, phase = %self.game.phase(), "Ignoring rematch vote");
            return;
        }

        let outcome = self.rematch.cast_vote(seat, conn, now);
        if outcome.window_opened {
            self.broadcast(
                sink,
                ServerEvent::RematchTimerStart {
                    timeout: self.rematch.window().as_secs(),
                },
            );
        }

        match outcome.verdict {
            VoteVerdict::Expired { .. } => self.resolve_rematch_timeout(sink),
            VoteVerdict::Pending { votes, time_left } => {
                self.broadcast(
                    sink,
                    ServerEvent::RematchVoteUpdate {
                        votes,
                        time_left: ceil_secs(time_left),
                    },
                );
            }
            VoteVerdict::Agreed { votes, time_left } => {
                self.broadcast(
                    sink,
                    ServerEvent::RematchVoteUpdate {
                        votes,
                        time_left: ceil_secs(time_left),
                    },
                );
                let turn = self.begin_match(now);
                self.broadcast(sink, ServerEvent::StopRematchTimer);
                self.broadcast(sink, ServerEvent::Restart { turn });
            }
        }
    }

    fn resolve_rematch_timeout(&mut self, sink: &mut impl EventSink) {
        let Some(voter) = self.rematch.resolve_timeout() else {
            return;
        };

        if let Some(conn) = self.seats.occupant(voter) {
            sink.send(
                conn,
                ServerEvent::WaitingForNewPlayer {
                    message: "Your opponent did not want a rematch. Waiting for a new player..."
                        .to_string(),
                },
            );
        }
        if let Some(conn) = self.seats.occupant(voter.opponent()) {
            sink.send(
                conn,
                ServerEvent::TimeoutDisconnect {
                    message: "You did not vote for a rematch in time".to_string(),
                },
            );
            sink.close(conn);
            self.seats.release(conn);
            info!(%conn, seat = %voter.opponent(), "Dropped seat that did not vote");
        }

        self.log.clear();
        self.game.reset();
        self.clock.clear();
    }

    // ─────────────────────────────────────────────────────────────
    //  Chat
    // ─────────────────────────────────────────────────────────────

    fn append_chat(&mut self, seat: Seat, text: &str, sink: &mut impl EventSink) {
        if let Some(entry) = self.log.append_chat(seat, text) {
            self.broadcast(sink, ServerEvent::Chat(entry));
        }
    }

    fn broadcast(&self, sink: &mut impl EventSink, event: ServerEvent) {
        for conn in self.seats.occupants() {
            sink.send(conn, event.clone());
        }
    }
}

/// Whole seconds, rounded up so a running window never reads as zero.
fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_secs(30)), 30);
        assert_eq!(ceil_secs(Duration::from_millis(29_001)), 30);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }
}
