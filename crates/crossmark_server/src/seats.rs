//! Seat allocation.

use crate::connection::ConnectionId;
use crate::seat_table::SeatTable;
use crossmark_board::Seat;
use derive_more::{Display, Error};
use tracing::{debug, info, instrument, warn};

/// Why a connection could not be seated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum SeatError {
    /// Both seats are taken.
    #[display("Game room is full")]
    RoomFull,
    /// The connection already holds a seat.
    #[display("Connection already holds seat {}", _0)]
    AlreadySeated(#[error(not(source))] Seat),
}

/// Binds connections to the two seats.
///
/// At most one connection per seat, and a connection holds at most one seat.
#[derive(Debug, Clone, Default)]
pub struct SeatAllocator {
    occupancy: SeatTable<Option<ConnectionId>>,
}

impl SeatAllocator {
    /// Creates an allocator with both seats free.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a connection.
    ///
    /// A free `backfill` seat wins over the normal X-then-O order.
    #[instrument(skip(self))]
    pub fn assign(
        &mut self,
        conn: ConnectionId,
        backfill: Option<Seat>,
    ) -> Result<Seat, SeatError> {
        if let Some(seat) = self.seat_of(conn) {
            debug!(%conn, %seat, "Connection already seated");
            return Err(SeatError::AlreadySeated(seat));
        }

        let seat = backfill
            .filter(|seat| self.occupant(*seat).is_none())
            .or_else(|| Seat::ALL.into_iter().find(|seat| self.occupant(*seat).is_none()));

        match seat {
            Some(seat) => {
                self.occupancy.set(seat, Some(conn));
                info!(%conn, %seat, backfill = backfill.is_some(), "Seat assigned");
                Ok(seat)
            }
            None => {
                warn!(%conn, "Both seats occupied");
                Err(SeatError::RoomFull)
            }
        }
    }

    /// Frees the seat held by a connection, returning it.
    #[instrument(skip(self))]
    pub fn release(&mut self, conn: ConnectionId) -> Option<Seat> {
        let seat = self.seat_of(conn)?;
        self.occupancy.set(seat, None);
        info!(%conn, %seat, "Seat released");
        Some(seat)
    }

    /// Seat held by a connection.
    pub fn seat_of(&self, conn: ConnectionId) -> Option<Seat> {
        self.occupancy
            .iter()
            .find_map(|(seat, occupant)| (*occupant == Some(conn)).then_some(seat))
    }

    /// Connection holding a seat.
    pub fn occupant(&self, seat: Seat) -> Option<ConnectionId> {
        *self.occupancy.get(seat)
    }

    /// Seated connections in seat order.
    pub fn occupants(&self) -> Vec<ConnectionId> {
        self.occupancy
            .iter()
            .filter_map(|(_, occupant)| *occupant)
            .collect()
    }

    /// Number of occupied seats.
    pub fn occupied_count(&self) -> usize {
        self.occupants().len()
    }

    /// Whether both seats are occupied.
    pub fn is_full(&self) -> bool {
        self.occupied_count() == 2
    }
}
