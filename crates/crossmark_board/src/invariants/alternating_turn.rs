//! Alternating turn invariant: X, O, X, O, ...

use super::Invariant;
use crate::{Game, Seat};

/// Invariant: seats alternate, starting with X.
///
/// While the game is in progress the seat to move must be the one the
/// history implies.
pub struct AlternatingTurnInvariant;

impl Invariant<Game> for AlternatingTurnInvariant {
    fn holds(game: &Game) -> bool {
        let history = game.history();

        if let Some(first) = history.first()
            && first.seat != Seat::X
        {
            return false;
        }

        if history.windows(2).any(|w| w[0].seat == w[1].seat) {
            return false;
        }

        if game.status().is_over() {
            return true;
        }

        let expected_next = if history.len() % 2 == 0 {
            Seat::X
        } else {
            Seat::O
        };
        game.to_move() == expected_next
    }

    fn description() -> &'static str {
        "Seats alternate turns (X, O, X, O, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Position};

    #[test]
    fn test_empty_game_holds() {
        assert!(AlternatingTurnInvariant::holds(&Game::new()));
    }

    #[test]
    fn test_alternating_sequence_holds() {
        let mut game = Game::new();
        for (seat, pos) in [
            (Seat::X, Position::TopLeft),
            (Seat::O, Position::Center),
            (Seat::X, Position::TopRight),
            (Seat::O, Position::BottomLeft),
            (Seat::X, Position::BottomRight),
        ] {
            game.make_move(Move::new(seat, pos)).unwrap();
        }
        assert!(AlternatingTurnInvariant::holds(&game));
        assert_eq!(game.to_move(), Seat::O);
    }

    #[test]
    fn test_same_seat_twice_violates() {
        let mut game = Game::new();
        game.make_move(Move::new(Seat::X, Position::TopLeft)).unwrap();

        game.history.push(Move::new(Seat::X, Position::Center));
        assert!(!AlternatingTurnInvariant::holds(&game));
    }
}
