use crate::slot_grid::SlotIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Room {
    #[serde(rename = "Meeting Room")]
    MeetingRoom,
    #[serde(rename = "Discussion Room")]
    DiscussionRoom,
}

impl Room {
    pub const ALL: [Room; 2] = [Room::MeetingRoom, Room::DiscussionRoom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Room::MeetingRoom => "Meeting Room",
            Room::DiscussionRoom => "Discussion Room",
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Room::ALL
            .into_iter()
            .find(|room| room.as_str() == value)
            .ok_or_else(|| format!("Unknown room: {value}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub room: Room,
    pub date: NaiveDate,
    pub start_slot: SlotIndex,
    pub end_slot: SlotIndex,
    pub name: String,
}

impl Booking {
    /// Half-open interval intersection of `[start_slot, end_slot)` with this booking.
    pub fn occupies(
        &self,
        room: Room,
        date: NaiveDate,
        start_slot: SlotIndex,
        end_slot: SlotIndex,
    ) -> bool {
        self.room == room
            && self.date == date
            && self.start_slot < end_slot
            && self.end_slot > start_slot
    }
}

/// A booking that has not been assigned an id by the store yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub room: Room,
    pub date: NaiveDate,
    pub start_slot: SlotIndex,
    pub end_slot: SlotIndex,
    pub name: String,
}

impl NewBooking {
    pub fn collides_with(&self, booking: &Booking) -> bool {
        booking.occupies(self.room, self.date, self.start_slot, self.end_slot)
    }

    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            room: self.room,
            date: self.date,
            start_slot: self.start_slot,
            end_slot: self.end_slot,
            name: self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CalendarCell {
    Booked { id: Uuid, name: String },
    Past,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub slot: String,
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekCalendar {
    pub room: Room,
    pub week: u32,
    /// `None` on the current week, which can't be left backwards.
    pub previous_week: Option<u32>,
    pub next_week: u32,
    pub dates: Vec<NaiveDate>,
    pub today: Option<NaiveDate>,
    pub rows: Vec<CalendarRow>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn booking(room: Room, day: u32, start: usize, end: usize) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            room,
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            start_slot: SlotIndex(start),
            end_slot: SlotIndex(end),
            name: "Stefan".into(),
        }
    }

    #[test_case::test_case(2, 4, true; "same range")]
    #[test_case::test_case(3, 4, true; "inside")]
    #[test_case::test_case(0, 6, true; "enclosing")]
    #[test_case::test_case(0, 2, false; "adjacent before")]
    #[test_case::test_case(4, 6, false; "adjacent after")]
    fn test_occupies(start: usize, end: usize, expected: bool) {
        let existing = booking(Room::MeetingRoom, 12, 2, 4);
        let date = existing.date;
        assert_eq!(
            existing.occupies(Room::MeetingRoom, date, SlotIndex(start), SlotIndex(end)),
            expected
        );
    }

    #[test]
    fn test_other_room_or_day_never_occupied() {
        let existing = booking(Room::MeetingRoom, 12, 2, 4);
        assert!(!existing.occupies(Room::DiscussionRoom, existing.date, SlotIndex(2), SlotIndex(4)));
        let next_day = existing.date.succ_opt().unwrap();
        assert!(!existing.occupies(Room::MeetingRoom, next_day, SlotIndex(2), SlotIndex(4)));
    }

    #[test]
    fn test_room_names() {
        assert_eq!(
            serde_json::to_string(&Room::MeetingRoom).unwrap(),
            "\"Meeting Room\""
        );
        assert_eq!("Discussion Room".parse::<Room>(), Ok(Room::DiscussionRoom));
        "Kitchen".parse::<Room>().unwrap_err();
    }
}
