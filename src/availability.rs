//! Slot classification and end-time computation for one room.
//!
//! Every operation works on the snapshot the model was built from. Callers
//! build a fresh model whenever the store publishes a new snapshot.

use crate::error::BookingError;
use crate::slot_grid::{SlotGrid, SlotIndex};
use crate::types::{Booking, CalendarCell, CalendarRow, NewBooking, Room, WeekCalendar};
use crate::week::{is_bookable_day, WeekOffset};
use chrono::{NaiveDate, NaiveDateTime};
use std::{cmp::Ordering, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState<'a> {
    Booked(&'a Booking),
    Past,
    Free,
}

#[derive(Debug, Clone)]
pub struct AvailabilityModel {
    grid: Arc<SlotGrid>,
    room: Room,
    bookings: Vec<Booking>,
}

impl AvailabilityModel {
    pub fn new(grid: Arc<SlotGrid>, room: Room, bookings: Vec<Booking>) -> Self {
        Self {
            grid,
            room,
            bookings,
        }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn booking_at(&self, date: NaiveDate, slot: SlotIndex) -> Option<&Booking> {
        self.bookings
            .iter()
            .find(|booking| booking.occupies(self.room, date, slot, slot.next()))
    }

    /// Booked takes precedence over past, so finished bookings stay visible.
    pub fn classify(&self, date: NaiveDate, slot: SlotIndex, now: NaiveDateTime) -> SlotState<'_> {
        if let Some(booking) = self.booking_at(date, slot) {
            return SlotState::Booked(booking);
        }
        if self.is_past(date, slot, now) {
            return SlotState::Past;
        }
        SlotState::Free
    }

    fn is_past(&self, date: NaiveDate, slot: SlotIndex, now: NaiveDateTime) -> bool {
        match date.cmp(&now.date()) {
            Ordering::Less => true,
            Ordering::Equal => self
                .grid
                .start_time(slot)
                .map_or(true, |start| start <= now.time()),
            Ordering::Greater => false,
        }
    }

    pub fn overlaps(&self, date: NaiveDate, start: SlotIndex, end: SlotIndex) -> bool {
        self.bookings
            .iter()
            .any(|booking| booking.occupies(self.room, date, start, end))
    }

    /// Empty on weekends.
    pub fn legal_end_times(&self, date: NaiveDate, start: SlotIndex) -> LegalEndTimes<'_> {
        LegalEndTimes {
            model: self,
            date,
            start,
            candidate: is_bookable_day(date).then(|| start.next()),
        }
    }

    /// Checks a submission against the snapshot and turns it into a [`NewBooking`].
    pub fn check_booking(
        &self,
        date: NaiveDate,
        start: SlotIndex,
        end: SlotIndex,
        name: &str,
        now: NaiveDateTime,
    ) -> Result<NewBooking, BookingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("a name is required".into()));
        }
        if !is_bookable_day(date) {
            return Err(BookingError::Validation(format!("{date} is not a weekday")));
        }
        if end <= start || end > self.grid.last() {
            return Err(BookingError::Validation(
                "the end time has to follow the start time".into(),
            ));
        }

        match self.classify(date, start, now) {
            SlotState::Booked(_) => return Err(BookingError::Conflict),
            SlotState::Past => {
                let label = self.grid.label(start).unwrap_or_default();
                return Err(BookingError::SlotPassed(format!("{date} {label}")));
            }
            SlotState::Free => {}
        }

        if !self
            .legal_end_times(date, start)
            .any(|candidate| candidate == end)
        {
            return Err(BookingError::Conflict);
        }

        Ok(NewBooking {
            room: self.room,
            date,
            start_slot: start,
            end_slot: end,
            name: name.to_string(),
        })
    }

    pub fn week_calendar(
        &self,
        week: WeekOffset,
        now: NaiveDateTime,
    ) -> Result<WeekCalendar, BookingError> {
        let today = now.date();
        let dates = week.dates(today).ok_or_else(|| {
            BookingError::Validation(format!("week {} is out of range", week.value()))
        })?;

        let rows = self
            .grid
            .indices()
            .zip(self.grid.labels())
            .map(|(slot, label)| CalendarRow {
                slot: label.clone(),
                cells: dates
                    .iter()
                    .map(|date| match self.classify(*date, slot, now) {
                        SlotState::Booked(booking) => CalendarCell::Booked {
                            id: booking.id,
                            name: booking.name.clone(),
                        },
                        SlotState::Past => CalendarCell::Past,
                        SlotState::Free => CalendarCell::Free,
                    })
                    .collect(),
            })
            .collect();

        Ok(WeekCalendar {
            room: self.room,
            week: week.value(),
            previous_week: (week != WeekOffset::default()).then(|| week.previous().value()),
            next_week: week.next().value(),
            dates: dates.to_vec(),
            today: dates.contains(&today).then_some(today),
            rows,
        })
    }
}

/// End slots reachable from a start slot without crossing an existing booking.
///
/// Stops at the first conflicting boundary instead of skipping over it. Clone
/// the iterator (or ask the model again) to restart the walk.
#[derive(Debug, Clone)]
pub struct LegalEndTimes<'a> {
    model: &'a AvailabilityModel,
    date: NaiveDate,
    start: SlotIndex,
    candidate: Option<SlotIndex>,
}

impl Iterator for LegalEndTimes<'_> {
    type Item = SlotIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let candidate = self.candidate?;
        if candidate > self.model.grid.last()
            || self.model.overlaps(self.date, self.start, candidate)
        {
            self.candidate = None;
            return None;
        }
        self.candidate = Some(candidate.next());
        Some(candidate)
    }
}
