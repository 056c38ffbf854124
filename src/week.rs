use chrono::{Datelike, Duration, NaiveDate};

pub const DAYS_PER_WEEK: usize = 5;

/// Rooms are booked Monday to Friday only.
pub fn is_bookable_day(date: NaiveDate) -> bool {
    (date.weekday().num_days_from_monday() as usize) < DAYS_PER_WEEK
}

/// Number of weeks after the current one. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekOffset(u32);

impl WeekOffset {
    pub fn new(offset: i64) -> Self {
        Self(offset.clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn previous(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Monday to Friday of the week `self` weeks after the one containing `today`.
    ///
    /// `None` once the week lies beyond the last date chrono can represent.
    pub fn dates(self, today: NaiveDate) -> Option<[NaiveDate; DAYS_PER_WEEK]> {
        let monday = today
            .checked_sub_signed(Duration::days(i64::from(
                today.weekday().num_days_from_monday(),
            )))?
            .checked_add_signed(Duration::weeks(i64::from(self.0)))?;
        monday.checked_add_signed(Duration::days(DAYS_PER_WEEK as i64 - 1))?;
        Some(std::array::from_fn(|day| monday + Duration::days(day as i64)))
    }
}
