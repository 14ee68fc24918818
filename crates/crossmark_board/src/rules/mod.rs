//! Rules for the 3x3 board.
//!
//! Pure functions over a [`Board`](super::Board), kept apart from board
//! storage so the engine and the invariants can share them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};
