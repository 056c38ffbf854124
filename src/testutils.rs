use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::StreamExt;
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::{
    backend::BookingStore,
    clock::Clock,
    error::StoreError,
    types::{Booking, NewBooking, Room},
};

pub struct MockBookingStoreInner {
    pub success: AtomicBool,
    pub calls_to_booking_stream: AtomicU64,
    pub calls_to_bookings: AtomicU64,
    pub calls_to_create_booking: AtomicU64,
    pub calls_to_remove_booking: AtomicU64,
    pub bookings: Mutex<Vec<Booking>>,
    pub sender: Sender<Vec<Booking>>,
}

/// Store double that counts calls and never checks for overlaps itself.
#[derive(Clone)]
pub struct MockBookingStore(pub Arc<MockBookingStoreInner>);

impl MockBookingStoreInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_booking_stream: AtomicU64::default(),
            calls_to_bookings: AtomicU64::default(),
            calls_to_create_booking: AtomicU64::default(),
            calls_to_remove_booking: AtomicU64::default(),
            bookings: Mutex::default(),
            sender: watch::channel(vec![]).0,
        }
    }
}

impl MockBookingStore {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingStoreInner::new()))
    }

    pub fn set_bookings(&self, bookings: Vec<Booking>) {
        *self.0.bookings.lock().unwrap() = bookings.clone();
        self.0.sender.send_replace(bookings);
    }

    fn bookings_unchecked(&self, room: Room) -> Vec<Booking> {
        self.0
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|booking| booking.room == room)
            .cloned()
            .collect()
    }

    fn result(&self) -> Result<(), StoreError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Unavailable("Supposed to fail".into())),
        }
    }
}

impl BookingStore for MockBookingStore {
    fn booking_stream(&self, _room: Room) -> WatchStream<Vec<Booking>> {
        self.0
            .calls_to_booking_stream
            .fetch_add(1, Ordering::SeqCst);
        WatchStream::new(self.0.sender.subscribe())
    }

    fn bookings(&self, room: Room) -> Result<Vec<Booking>, StoreError> {
        self.0.calls_to_bookings.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.bookings_unchecked(room))
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Uuid, StoreError> {
        self.0
            .calls_to_create_booking
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let id = Uuid::new_v4();
        self.0
            .bookings
            .lock()
            .unwrap()
            .push(booking.into_booking(id));
        Ok(id)
    }

    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        self.0
            .calls_to_remove_booking
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.0
            .bookings
            .lock()
            .unwrap()
            .retain(|booking| booking.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Wednesday 2026-10-14, 14:00.
pub fn wednesday_afternoon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(14, 0, 0).unwrap())
}

pub async fn read_from_booking_stream(booking_stream: &mut WatchStream<Vec<Booking>>) -> Vec<Booking> {
    tokio::time::timeout(Duration::from_secs(1), booking_stream.next())
        .await
        .expect("No booking snapshot received")
        .expect("Booking stream closed")
}
