use crate::{
    access::AccessPolicy,
    availability::AvailabilityModel,
    backend::BookingStore,
    clock::Clock,
    error::BookingError,
    identity::Identity,
    slot_grid::{SlotGrid, SlotIndex},
    types::{Booking, Room, WeekCalendar},
    week::{is_bookable_day, WeekOffset},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything a booking operation needs: the store, the slot grid, the admin
/// allow-list and the clock deciding which slots already passed.
#[derive(Clone)]
pub struct BookingService<T: BookingStore> {
    store: T,
    grid: Arc<SlotGrid>,
    access_policy: Arc<AccessPolicy>,
    clock: Arc<dyn Clock>,
}

impl<T: BookingStore> BookingService<T> {
    pub fn new(
        store: T,
        grid: Arc<SlotGrid>,
        access_policy: AccessPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            grid,
            access_policy: Arc::new(access_policy),
            clock,
        }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.access_policy.is_admin(identity)
    }

    pub fn subscribe(&self, room: Room) -> WatchStream<Vec<Booking>> {
        info!(%room, "New booking subscription");
        self.store.booking_stream(room)
    }

    /// Builds a model from the latest snapshot of the room.
    pub fn availability(&self, room: Room) -> Result<AvailabilityModel, BookingError> {
        let bookings = self.store.bookings(room).map_err(|err| {
            error!(%err, %room, "Failed to load bookings");
            BookingError::from(err)
        })?;
        Ok(AvailabilityModel::new(self.grid.clone(), room, bookings))
    }

    pub fn week_calendar(&self, room: Room, week: WeekOffset) -> Result<WeekCalendar, BookingError> {
        self.availability(room)?.week_calendar(week, self.clock.now())
    }

    pub fn legal_end_times(
        &self,
        room: Room,
        date: NaiveDate,
        start: &str,
    ) -> Result<Vec<String>, BookingError> {
        let start = self.slot(start)?;
        if !is_bookable_day(date) {
            return Err(BookingError::Validation(format!("{date} is not a weekday")));
        }
        let model = self.availability(room)?;
        Ok(model
            .legal_end_times(date, start)
            .filter_map(|end| model.grid().label(end).map(String::from))
            .collect())
    }

    /// Re-checks the request against a fresh snapshot before writing it.
    pub fn submit_booking(
        &self,
        room: Room,
        date: NaiveDate,
        start: &str,
        end: &str,
        name: &str,
    ) -> Result<Uuid, BookingError> {
        let start = self.slot(start)?;
        let end = self.slot(end)?;
        let model = self.availability(room)?;

        let booking = model
            .check_booking(date, start, end, name, self.clock.now())
            .inspect_err(|err| warn!(%err, %room, %date, "Booking rejected"))?;

        let id = self.store.create_booking(booking).map_err(|err| {
            error!(%err, %room, %date, "Booking can't be created");
            BookingError::from(err)
        })?;
        info!(%id, %room, %date, "Room booked");
        Ok(id)
    }

    pub fn delete_booking(&self, identity: &Identity, id: Uuid) -> Result<(), BookingError> {
        if let Err(err) = self.access_policy.ensure_admin(identity) {
            warn!(email = %identity.email, %id, "Booking removal refused");
            return Err(err);
        }

        self.store.remove_booking(id).map_err(|err| {
            error!(%err, %id, "Booking can't be removed");
            BookingError::from(err)
        })?;
        info!(%id, email = %identity.email, "Booking removed");
        Ok(())
    }

    fn slot(&self, label: &str) -> Result<SlotIndex, BookingError> {
        self.grid
            .index_of(label)
            .ok_or_else(|| BookingError::Validation(format!("'{label}' is not a bookable time")))
    }
}
