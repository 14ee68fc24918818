//! Monotonic board invariant: squares never change once set.

use super::Invariant;
use crate::{Board, Game, Square};

/// Invariant: board squares are never overwritten.
///
/// Replaying the move history onto an empty board must only ever fill empty
/// squares and must reproduce the current board exactly.
pub struct MonotonicBoardInvariant;

impl Invariant<Game> for MonotonicBoardInvariant {
    fn holds(game: &Game) -> bool {
        let mut reconstructed = Board::new();

        for mov in game.history() {
            if reconstructed.get(mov.position) != Square::Empty {
                return false;
            }
            reconstructed.set(mov.position, Square::Occupied(mov.seat));
        }

        reconstructed == *game.board()
    }

    fn description() -> &'static str {
        "Board squares are monotonic (never overwritten)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Position, Seat};

    #[test]
    fn test_empty_game_holds() {
        assert!(MonotonicBoardInvariant::holds(&Game::new()));
    }

    #[test]
    fn test_multiple_moves_hold() {
        let mut game = Game::new();
        for (seat, pos) in [
            (Seat::X, Position::TopLeft),
            (Seat::O, Position::Center),
            (Seat::X, Position::TopRight),
            (Seat::O, Position::BottomLeft),
        ] {
            game.make_move(Move::new(seat, pos)).unwrap();
        }
        assert!(MonotonicBoardInvariant::holds(&game));
    }

    #[test]
    fn test_corrupted_board_violates() {
        let mut game = Game::new();
        game.make_move(Move::new(Seat::X, Position::Center)).unwrap();

        game.board.set(Position::Center, Square::Occupied(Seat::O));
        assert!(!MonotonicBoardInvariant::holds(&game));
    }

    #[test]
    fn test_repeated_square_in_history_violates() {
        let mut game = Game::new();
        game.make_move(Move::new(Seat::X, Position::Center)).unwrap();

        game.history.push(Move::new(Seat::O, Position::Center));
        assert!(!MonotonicBoardInvariant::holds(&game));
    }
}
