//! Two-entry table keyed by seat.

use crossmark_board::Seat;
use derive_getters::Getters;
use serde::Serialize;

/// One value per seat, with named accessors.
///
/// Serializes as `{"X": .., "O": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Getters, Serialize, derive_new::new)]
pub struct SeatTable<T> {
    /// Entry for seat X.
    #[serde(rename = "X")]
    x: T,
    /// Entry for seat O.
    #[serde(rename = "O")]
    o: T,
}

impl<T> SeatTable<T> {
    /// Returns the entry for a seat.
    pub fn get(&self, seat: Seat) -> &T {
        match seat {
            Seat::X => &self.x,
            Seat::O => &self.o,
        }
    }

    /// Returns the entry for a seat mutably.
    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        match seat {
            Seat::X => &mut self.x,
            Seat::O => &mut self.o,
        }
    }

    /// Replaces the entry for a seat, returning the previous value.
    pub fn set(&mut self, seat: Seat, value: T) -> T {
        std::mem::replace(self.get_mut(seat), value)
    }

    /// Iterates entries in seat order (X, then O).
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        Seat::ALL.into_iter().map(move |seat| (seat, self.get(seat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_agree() {
        let mut table = SeatTable::new(1, 2);
        assert_eq!(*table.x(), 1);
        assert_eq!(*table.get(Seat::O), 2);

        let previous = table.set(Seat::X, 7);
        assert_eq!(previous, 1);
        assert_eq!(*table.get(Seat::X), 7);
    }

    #[test]
    fn test_iter_in_seat_order() {
        let table = SeatTable::new("first", "second");
        let seats: Vec<_> = table.iter().map(|(seat, v)| (seat, *v)).collect();
        assert_eq!(seats, vec![(Seat::X, "first"), (Seat::O, "second")]);
    }

    #[test]
    fn test_serializes_keyed_by_symbol() {
        let votes = SeatTable::new(true, false);
        let json = serde_json::to_value(votes).unwrap();
        assert_eq!(json, serde_json::json!({"X": true, "O": false}));
    }
}
