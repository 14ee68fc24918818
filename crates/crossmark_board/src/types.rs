//! Core domain types for the 3x3 board.

use super::Position;
use serde::{Deserialize, Serialize};

/// One of the two fixed seats at the table.
///
/// Seat `X` always moves first. On the wire a seat is its symbol, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    /// Seat X (goes first).
    X,
    /// Seat O (goes second).
    O,
}

impl Seat {
    /// Both seats in allocation order.
    pub const ALL: [Seat; 2] = [Seat::X, Seat::O];

    /// Returns the opposing seat.
    pub fn opponent(self) -> Self {
        match self {
            Seat::X => Seat::O,
            Seat::O => Seat::X,
        }
    }

    /// Returns the wire symbol for this seat.
    pub fn symbol(self) -> &'static str {
        match self {
            Seat::X => "X",
            Seat::O => "O",
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square holding a seat's marker.
    Occupied(Seat),
}

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Game ended with three in a row.
    Won(Seat),
    /// Board filled without a line.
    Draw,
}

impl GameStatus {
    /// Returns true once the game has a winner or is drawn.
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for seat in Seat::ALL {
            assert_ne!(seat.opponent(), seat);
            assert_eq!(seat.opponent().opponent(), seat);
        }
    }

    #[test]
    fn test_seat_serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&Seat::X).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&Seat::O).unwrap(), "\"O\"");
    }
}
