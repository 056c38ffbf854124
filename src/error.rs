use chrono::NaiveTime;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Timeslot {0} already passed")]
    SlotPassed(String),

    #[error("Requested time range overlaps an existing booking")]
    Conflict,

    #[error("Only administrators may remove bookings")]
    Forbidden,

    #[error("Booking {0} does not exist")]
    NotFound(Uuid),

    #[error("Booking store error: {0}")]
    Gateway(String),
}

/// Failures reported by a [`crate::backend::BookingStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Booking overlaps an existing booking")]
    Conflict,

    #[error("Booking {0} does not exist")]
    NotFound(Uuid),

    #[error("Booking store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => BookingError::Conflict,
            StoreError::NotFound(id) => BookingError::NotFound(id),
            StoreError::Unavailable(message) => BookingError::Gateway(message),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Slot length of {0} minutes does not divide a day")]
    SlotLength(u32),

    #[error("Opening hours {opening} - {closing} do not hold at least two slots")]
    OpeningHours {
        opening: NaiveTime,
        closing: NaiveTime,
    },
}
