//! First-class move types.
//!
//! A move is the intent of a seat to place its marker. It is validated
//! against the game before it is applied.

use super::{Position, Seat};
use serde::{Deserialize, Serialize};

/// A seat placing its marker at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The seat making the move.
    pub seat: Seat,
    /// Where the marker goes.
    pub position: Position,
}

impl Move {
    /// Creates a new move.
    pub fn new(seat: Seat, position: Position) -> Self {
        Self { seat, position }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.seat, self.position.label())
    }
}

/// Why a move was not applied.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The square at the position is already occupied.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(Position),

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,

    /// It's not this seat's turn.
    #[display("It's not {}'s turn", _0)]
    WrongSeat(Seat),

    /// A postcondition failed after applying the move.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for MoveError {}
