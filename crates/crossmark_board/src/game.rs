//! In-place game engine.

use super::action::{Move, MoveError};
#[cfg(debug_assertions)]
use super::invariants::{GameInvariants, InvariantSet};
use super::rules;
use super::{Board, GameStatus, Position, Seat, Square};
use tracing::{debug, instrument};

/// A single game on the 3x3 board.
///
/// The engine is mutated in place and reset between matches. Once a
/// square is set it is never cleared except by [`Game::reset`].
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) to_move: Seat,
    pub(crate) history: Vec<Move>,
    pub(crate) status: GameStatus,
}

impl Game {
    /// Creates a new game with seat X to move.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Seat::X,
            history: Vec::new(),
            status: GameStatus::InProgress,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the seat whose turn it is.
    ///
    /// After the game ends this is the seat that made the last move.
    pub fn to_move(&self) -> Seat {
        self.to_move
    }

    /// Returns the accepted moves in order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the empty positions.
    pub fn valid_moves(&self) -> Vec<Position> {
        Position::valid_moves(&self.board)
    }

    /// Clears the board and gives the first move back to seat X.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Validates and applies a move.
    ///
    /// On success the returned status tells the caller whether the move
    /// ended the game. The turn passes to the opponent only while the game
    /// stays in progress. On any error the game is left untouched.
    #[instrument(skip(self), fields(action = %action))]
    pub fn make_move(&mut self, action: Move) -> Result<GameStatus, MoveError> {
        if self.status.is_over() {
            return Err(MoveError::GameOver);
        }
        if action.seat != self.to_move {
            return Err(MoveError::WrongSeat(action.seat));
        }
        if !self.board.is_empty(action.position) {
            return Err(MoveError::SquareOccupied(action.position));
        }

        let mut next = self.clone();
        next.board
            .set(action.position, Square::Occupied(action.seat));
        next.history.push(action);

        next.status = if let Some(winner) = rules::check_winner(&next.board) {
            GameStatus::Won(winner)
        } else if rules::is_full(&next.board) {
            GameStatus::Draw
        } else {
            next.to_move = next.to_move.opponent();
            GameStatus::InProgress
        };

        #[cfg(debug_assertions)]
        if let Err(violations) = GameInvariants::check_all(&next) {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            tracing::error!(%descriptions, "Postcondition failed; move discarded");
            return Err(MoveError::InvariantViolation(descriptions));
        }

        *self = next;
        debug!(status = ?self.status, moves = self.history.len(), "Move applied");
        Ok(self.status)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(debug_assertions)]
    fn test_failed_postcondition_leaves_game_untouched() {
        let mut game = Game::new();
        game.make_move(Move::new(Seat::X, Position::Center)).unwrap();

        // A square set behind the engine's back: no history entry for it.
        game.board.set(Position::TopLeft, Square::Occupied(Seat::O));

        let result = game.make_move(Move::new(Seat::O, Position::BottomRight));

        assert!(matches!(result, Err(MoveError::InvariantViolation(_))));
        assert!(game.board().is_empty(Position::BottomRight));
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.to_move(), Seat::O);
        assert_eq!(game.status(), GameStatus::InProgress);
    }
}
