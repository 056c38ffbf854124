use crate::error::ConfigurationError;
use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Ordinal position of a label inside a [`SlotGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Ordered time-of-day labels of one booking day, from opening to closing time inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    start_times: Vec<NaiveTime>,
    labels: Vec<String>,
}

impl SlotGrid {
    pub fn new(
        opening: NaiveTime,
        closing: NaiveTime,
        slot_minutes: u32,
    ) -> Result<Self, ConfigurationError> {
        if slot_minutes == 0 || 24 * 60 % slot_minutes != 0 {
            return Err(ConfigurationError::SlotLength(slot_minutes));
        }
        if opening >= closing {
            return Err(ConfigurationError::OpeningHours { opening, closing });
        }

        let step = Duration::minutes(i64::from(slot_minutes));
        let mut start_times = Vec::new();
        let mut time = opening;
        while time <= closing {
            start_times.push(time);
            let (next, wrapped) = time.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            time = next;
        }
        if start_times.len() < 2 {
            return Err(ConfigurationError::OpeningHours { opening, closing });
        }

        Ok(Self::from_start_times(start_times))
    }

    fn from_start_times(start_times: Vec<NaiveTime>) -> Self {
        let labels = start_times.iter().map(|time| format_label(*time)).collect();
        Self {
            start_times,
            labels,
        }
    }

    pub fn last(&self) -> SlotIndex {
        SlotIndex(self.labels.len() - 1)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn indices(&self) -> impl Iterator<Item = SlotIndex> {
        (0..self.labels.len()).map(SlotIndex)
    }

    pub fn label(&self, index: SlotIndex) -> Option<&str> {
        self.labels.get(index.0).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<SlotIndex> {
        self.labels
            .iter()
            .position(|candidate| candidate == label.trim())
            .map(SlotIndex)
    }

    pub fn start_time(&self, index: SlotIndex) -> Option<NaiveTime> {
        self.start_times.get(index.0).copied()
    }

    /// `None` for times between two labels or outside the opening hours.
    pub fn index_at(&self, time: NaiveTime) -> Option<SlotIndex> {
        self.start_times
            .binary_search(&time)
            .ok()
            .map(SlotIndex)
    }
}

impl Default for SlotGrid {
    /// 9:00 to 19:00 in half-hour steps.
    fn default() -> Self {
        Self::from_start_times(
            (9 * 60..=19 * 60)
                .step_by(30)
                .map(|minutes| NaiveTime::MIN + Duration::minutes(minutes))
                .collect(),
        )
    }
}

fn format_label(time: NaiveTime) -> String {
    format!("{}:{:02}", time.hour(), time.minute())
}

/// Parses `H:MM` or `HH:MM`.
pub fn parse_slot_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|err| format!("'{value}' is not a time of day: {err}"))
}
