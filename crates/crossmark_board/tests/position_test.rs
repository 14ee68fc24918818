//! Tests for the position enum.

use crossmark_board::{Board, Position, Seat, Square};
use strum::IntoEnumIterator;

#[test]
fn test_position_to_index() {
    assert_eq!(Position::TopLeft.to_index(), 0);
    assert_eq!(Position::Center.to_index(), 4);
    assert_eq!(Position::BottomRight.to_index(), 8);
}

#[test]
fn test_position_from_index() {
    assert_eq!(Position::from_index(0), Some(Position::TopLeft));
    assert_eq!(Position::from_index(4), Some(Position::Center));
    assert_eq!(Position::from_index(8), Some(Position::BottomRight));
    assert_eq!(Position::from_index(9), None);
    assert_eq!(Position::from_index(usize::MAX), None);
}

#[test]
fn test_iteration_matches_index_order() {
    for (index, pos) in Position::iter().enumerate() {
        assert_eq!(pos.to_index(), index);
        assert_eq!(Position::from_index(index), Some(pos));
    }
    assert_eq!(Position::iter().count(), 9);
}

#[test]
fn test_valid_moves_empty_board() {
    let board = Board::new();
    assert_eq!(Position::valid_moves(&board).len(), 9);
}

#[test]
fn test_valid_moves_filters_occupied() {
    let mut board = Board::new();
    board.set(Position::TopLeft, Square::Occupied(Seat::X));
    board.set(Position::Center, Square::Occupied(Seat::O));

    let valid = Position::valid_moves(&board);
    assert_eq!(valid.len(), 7);
    assert!(!valid.contains(&Position::TopLeft));
    assert!(!valid.contains(&Position::Center));
    assert!(valid.contains(&Position::BottomRight));
}
