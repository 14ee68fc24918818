//! Crossmark board - pure 3x3 game logic.
//!
//! Seats, positions, the in-place [`Game`] engine, and the win/draw rules.
//! No I/O and no clocks: the match session server builds on top of this.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod game;
pub mod invariants;
mod position;
pub mod rules;
mod types;

pub use action::{Move, MoveError};
pub use game::Game;
pub use invariants::{
    AlternatingTurnInvariant, GameInvariants, Invariant, InvariantSet, InvariantViolation,
    MonotonicBoardInvariant,
};
pub use position::Position;
pub use types::{Board, GameStatus, Seat, Square};
