use crate::error::StoreError;
use crate::types::{Booking, NewBooking, Room};
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

pub trait BookingStore: Clone + Send + Sync + 'static {
    /// Yields the room's current bookings right away and again after every change.
    fn booking_stream(&self, room: Room) -> WatchStream<Vec<Booking>>;
    fn bookings(&self, room: Room) -> Result<Vec<Booking>, StoreError>;
    /// Rejects the booking with [`StoreError::Conflict`] if it overlaps a stored one.
    fn create_booking(&self, booking: NewBooking) -> Result<Uuid, StoreError>;
    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError>;
}
