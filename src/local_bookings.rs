use crate::{
    backend::BookingStore,
    error::StoreError,
    types::{Booking, NewBooking, Room},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info};
use uuid::Uuid;

/// Bookings kept in memory. Lost on restart.
#[derive(Debug, Clone)]
pub struct LocalBookings {
    bookings: Arc<Mutex<HashMap<Uuid, Booking>>>,
    senders: Arc<HashMap<Room, Sender<Vec<Booking>>>>,
}

impl Default for LocalBookings {
    fn default() -> Self {
        let senders = Room::ALL
            .into_iter()
            .map(|room| (room, watch::channel(vec![]).0))
            .collect();
        Self {
            bookings: Arc::new(Mutex::default()),
            senders: Arc::new(senders),
        }
    }
}

impl LocalBookings {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Booking>>, StoreError> {
        self.bookings.lock().map_err(|err| {
            error!(%err, "Booking storage lock poisoned");
            StoreError::Unavailable("booking storage lock poisoned".into())
        })
    }

    fn room_bookings(bookings: &HashMap<Uuid, Booking>, room: Room) -> Vec<Booking> {
        let mut room_bookings: Vec<Booking> = bookings
            .values()
            .filter(|booking| booking.room == room)
            .cloned()
            .collect();
        room_bookings.sort_unstable_by(|a, b| {
            (a.date, a.start_slot).cmp(&(b.date, b.start_slot))
        });
        room_bookings
    }

    fn send_bookings(&self, bookings: &HashMap<Uuid, Booking>, room: Room) {
        if let Some(sender) = self.senders.get(&room) {
            sender.send_replace(Self::room_bookings(bookings, room));
        }
    }
}

impl BookingStore for LocalBookings {
    fn booking_stream(&self, room: Room) -> WatchStream<Vec<Booking>> {
        match self.senders.get(&room) {
            Some(sender) => WatchStream::new(sender.subscribe()),
            None => WatchStream::new(watch::channel(vec![]).1),
        }
    }

    fn bookings(&self, room: Room) -> Result<Vec<Booking>, StoreError> {
        Ok(Self::room_bookings(&*self.lock()?, room))
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Uuid, StoreError> {
        let mut bookings = self.lock()?;
        if bookings.values().any(|existing| booking.collides_with(existing)) {
            error!(room = %booking.room, date = %booking.date, "Booking overlaps an existing booking");
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4();
        let room = booking.room;
        bookings.insert(id, booking.into_booking(id));
        info!(%id, %room, "Booking created");
        self.send_bookings(&bookings, room);
        Ok(id)
    }

    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        let mut bookings = self.lock()?;
        let Some(removed) = bookings.remove(&id) else {
            error!(%id, "Booking does not exist and can't be removed");
            return Err(StoreError::NotFound(id));
        };
        info!(%id, room = %removed.room, "Booking removed");
        self.send_bookings(&bookings, removed.room);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{slot_grid::SlotIndex, testutils::read_from_booking_stream};
    use chrono::NaiveDate;

    fn new_booking(room: Room, start: usize, end: usize, name: &str) -> NewBooking {
        NewBooking {
            room,
            date: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            start_slot: SlotIndex(start),
            end_slot: SlotIndex(end),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_create_remove_single_booking() {
        let local_bookings = LocalBookings::default();
        let mut booking_stream = local_bookings.booking_stream(Room::MeetingRoom);
        assert!(read_from_booking_stream(&mut booking_stream).await.is_empty());

        let id = local_bookings
            .create_booking(new_booking(Room::MeetingRoom, 2, 4, "Stefan"))
            .unwrap();

        let bookings = read_from_booking_stream(&mut booking_stream).await;
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, id);
        assert_eq!(bookings[0].name, "Stefan");

        local_bookings.remove_booking(id).unwrap();
        let bookings = read_from_booking_stream(&mut booking_stream).await;
        assert_eq!(bookings.len(), 0);

        assert_eq!(
            local_bookings.remove_booking(id),
            Err(StoreError::NotFound(id))
        );
    }

    #[test]
    fn test_reject_overlapping_booking() {
        let local_bookings = LocalBookings::default();
        local_bookings
            .create_booking(new_booking(Room::MeetingRoom, 2, 4, "Stefan"))
            .unwrap();

        assert_eq!(
            local_bookings.create_booking(new_booking(Room::MeetingRoom, 2, 3, "Peter")),
            Err(StoreError::Conflict)
        );
        local_bookings
            .create_booking(new_booking(Room::MeetingRoom, 4, 5, "Peter"))
            .unwrap();
        local_bookings
            .create_booking(new_booking(Room::DiscussionRoom, 2, 4, "Peter"))
            .unwrap();

        let bookings = local_bookings.bookings(Room::MeetingRoom).unwrap();
        assert_eq!(bookings.len(), 2);
        for (i, a) in bookings.iter().enumerate() {
            for b in &bookings[i + 1..] {
                assert!(!a.occupies(b.room, b.date, b.start_slot, b.end_slot));
            }
        }
    }

    #[test]
    fn test_bookings_sorted_and_filtered_by_room() {
        let local_bookings = LocalBookings::default();
        local_bookings
            .create_booking(new_booking(Room::MeetingRoom, 6, 8, "Third"))
            .unwrap();
        local_bookings
            .create_booking(new_booking(Room::MeetingRoom, 0, 2, "First"))
            .unwrap();
        local_bookings
            .create_booking(new_booking(Room::DiscussionRoom, 0, 2, "Elsewhere"))
            .unwrap();

        let bookings = local_bookings.bookings(Room::MeetingRoom).unwrap();
        let names: Vec<&str> = bookings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }

    #[tokio::test]
    async fn test_streams_only_see_their_room() {
        let local_bookings = LocalBookings::default();
        let mut meeting_stream = local_bookings.booking_stream(Room::MeetingRoom);
        let mut discussion_stream = local_bookings.booking_stream(Room::DiscussionRoom);
        read_from_booking_stream(&mut meeting_stream).await;
        read_from_booking_stream(&mut discussion_stream).await;

        local_bookings
            .create_booking(new_booking(Room::DiscussionRoom, 0, 2, "Peter"))
            .unwrap();

        let bookings = read_from_booking_stream(&mut discussion_stream).await;
        assert_eq!(bookings.len(), 1);

        // A late subscriber gets the current snapshot immediately.
        let mut late_stream = local_bookings.booking_stream(Room::DiscussionRoom);
        assert_eq!(read_from_booking_stream(&mut late_stream).await, bookings);
        assert!(local_bookings.bookings(Room::MeetingRoom).unwrap().is_empty());
    }
}
