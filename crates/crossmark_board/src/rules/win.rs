//! Win detection.

use super::super::{Board, Position, Seat, Square};
use tracing::instrument;

/// The 8 canonical lines: 3 rows, 3 columns, 2 diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
    ],
    [
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ],
    // Columns
    [
        Position::TopLeft,
        Position::MiddleLeft,
        Position::BottomLeft,
    ],
    [
        Position::TopCenter,
        Position::Center,
        Position::BottomCenter,
    ],
    [
        Position::TopRight,
        Position::MiddleRight,
        Position::BottomRight,
    ],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Returns the seat holding three in a row, if any.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Seat> {
    for [a, b, c] in LINES {
        let sq = board.get(a);
        if sq != Square::Empty && sq == board.get(b) && sq == board.get(c) {
            return match sq {
                Square::Occupied(seat) => Some(seat),
                Square::Empty => None,
            };
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(seat: Seat, cells: &[Position]) -> Board {
        let mut board = Board::new();
        for pos in cells {
            board.set(*pos, Square::Occupied(seat));
        }
        board
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(check_winner(&Board::new()), None);
    }

    #[test]
    fn test_every_line_wins() {
        for line in LINES {
            assert_eq!(check_winner(&board_with(Seat::X, &line)), Some(Seat::X));
            assert_eq!(check_winner(&board_with(Seat::O, &line)), Some(Seat::O));
        }
    }

    #[test]
    fn test_mixed_line_does_not_win() {
        let mut board = board_with(Seat::X, &[Position::TopLeft, Position::TopCenter]);
        board.set(Position::TopRight, Square::Occupied(Seat::O));
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_non_line_triple_does_not_win() {
        // Three corners are not a line.
        let board = board_with(
            Seat::X,
            &[Position::TopLeft, Position::TopRight, Position::BottomLeft],
        );
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_exactly_eight_lines_win() {
        // Every 3-cell subset of the board wins iff it is one of the canonical lines.
        let mut winning = 0;
        for a in 0..9 {
            for b in (a + 1)..9 {
                for c in (b + 1)..9 {
                    let cells: Vec<Position> = [a, b, c]
                        .iter()
                        .filter_map(|i| Position::from_index(*i))
                        .collect();
                    if check_winner(&board_with(Seat::O, &cells)).is_some() {
                        winning += 1;
                    }
                }
            }
        }
        assert_eq!(winning, 8);
    }
}
