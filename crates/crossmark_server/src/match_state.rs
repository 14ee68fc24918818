//! Board, active seat and match phase.

use crossmark_board::{Board, Game, GameStatus, Move, MoveError, Position, Seat};
use derive_more::Display;
use tracing::{debug, info, instrument};

/// Where the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MatchPhase {
    /// Fewer than two seats occupied.
    AwaitingPlayers,
    /// Both seats occupied, board not terminal.
    InProgress,
    /// Won, drawn or forfeited; waiting on a rematch.
    Terminal,
}

/// A move the state machine accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedMove {
    /// Where the marker went.
    pub position: Position,
    /// Who moved.
    pub seat: Seat,
    /// Game status after the move.
    pub status: GameStatus,
}

/// Why a move was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Display, derive_more::From)]
pub enum MoveRejection {
    /// No match is running.
    #[display("No match in progress")]
    NotInProgress,
    /// The index is not a cell.
    #[display("Position {} is off the board", _0)]
    OutOfRange(usize),
    /// The engine refused the move.
    #[display("{}", _0)]
    #[from]
    Illegal(MoveError),
}

/// The match being played on the shared session record.
#[derive(Debug, Clone)]
pub struct MatchState {
    phase: MatchPhase,
    game: Game,
}

impl MatchState {
    /// Creates an empty match waiting for players.
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::AwaitingPlayers,
            game: Game::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// The board.
    pub fn board(&self) -> &Board {
        self.game.board()
    }

    /// The underlying engine.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Seat whose turn it is.
    pub fn active_seat(&self) -> Seat {
        self.game.to_move()
    }

    /// Full reset into a fresh match with seat X to move.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn begin(&mut self) -> Seat {
        self.game.reset();
        self.phase = MatchPhase::InProgress;
        info!("Match started");
        self.game.to_move()
    }

    /// Full reset back to waiting for players.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn reset(&mut self) {
        self.game.reset();
        self.phase = MatchPhase::AwaitingPlayers;
        debug!("Match reset");
    }

    /// Applies a move for `seat` at cell `index`.
    ///
    /// The move must come from the active seat, name a cell 0-8, and land on
    /// an empty cell. A move that ends the game moves the phase to `Terminal`.
    #[instrument(skip(self))]
    pub fn apply_move(&mut self, seat: Seat, index: usize) -> Result<AcceptedMove, MoveRejection> {
        if self.phase != MatchPhase::InProgress {
            return Err(MoveRejection::NotInProgress);
        }
        let position = Position::from_index(index).ok_or(MoveRejection::OutOfRange(index))?;

        let status = self.game.make_move(Move::new(seat, position))?;
        if status.is_over() {
            self.phase = MatchPhase::Terminal;
        }

        Ok(AcceptedMove {
            position,
            seat,
            status,
        })
    }

    /// Ends the running match as a loss for the active seat.
    ///
    /// The board is left as it stands. Returns the losing seat, or `None`
    /// if no match is running.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn forfeit(&mut self) -> Option<Seat> {
        if self.phase != MatchPhase::InProgress {
            return None;
        }
        self.phase = MatchPhase::Terminal;
        let loser = self.game.to_move();
        info!(%loser, "Active seat forfeited");
        Some(loser)
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}
