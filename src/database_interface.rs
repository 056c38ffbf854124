use crate::{
    backend::BookingStore,
    error::StoreError,
    schema::bookings,
    slot_grid::{SlotGrid, SlotIndex},
    types::{Booking, NewBooking, Room},
};
use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct BookingRow {
    id: Uuid,
    room: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    name: String,
}

#[derive(Insertable)]
#[diesel(table_name = bookings)]
struct NewBookingRow<'a> {
    id: Uuid,
    room: &'a str,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    name: &'a str,
}

/// Maps the stored times back onto the configured grid.
fn booking_from_row(grid: &SlotGrid, row: BookingRow) -> Result<Booking, StoreError> {
    let slot = |time: NaiveTime| {
        grid.index_at(time).ok_or_else(|| {
            StoreError::Unavailable(format!("Stored time {time} is not on the slot grid"))
        })
    };

    Ok(Booking {
        id: row.id,
        room: row.room.parse().map_err(StoreError::Unavailable)?,
        date: row.date,
        start_slot: slot(row.start_time)?,
        end_slot: slot(row.end_time)?,
        name: row.name,
    })
}

fn time_column(grid: &SlotGrid, slot: SlotIndex) -> Result<NaiveTime, StoreError> {
    grid.start_time(slot)
        .ok_or_else(|| StoreError::Unavailable(format!("Slot {} is not on the slot grid", slot.0)))
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Bookings persisted in PostgreSQL.
///
/// Rows store times of day, so they survive a change of the slot grid. Rows
/// that don't fall onto the current grid are left out of every snapshot but
/// still block overlapping inserts.
#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
    grid: Arc<SlotGrid>,
    senders: Arc<HashMap<Room, Sender<Vec<Booking>>>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str, grid: Arc<SlotGrid>) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        let senders = Room::ALL
            .into_iter()
            .map(|room| (room, watch::channel(vec![]).0))
            .collect();
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            grid,
            senders: Arc::new(senders),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn lock(&self) -> Result<MutexGuard<'_, PgConnection>, StoreError> {
        self.connection.lock().map_err(|err| {
            error!(%err, "Database connection lock poisoned");
            StoreError::Unavailable("database connection lock poisoned".into())
        })
    }

    fn load_room(
        &self,
        connection: &mut PgConnection,
        room: Room,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows = bookings::table
            .filter(bookings::room.eq(room.as_str()))
            .order((bookings::date.asc(), bookings::start_time.asc()))
            .select(BookingRow::as_select())
            .load(connection)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                booking_from_row(&self.grid, row)
                    .inspect_err(|err| error!(%err, %id, "Skipping stored booking"))
                    .ok()
            })
            .collect())
    }

    fn send_bookings(&self, connection: &mut PgConnection, room: Room) {
        let Some(sender) = self.senders.get(&room) else {
            return;
        };
        match self.load_room(connection, room) {
            Ok(bookings) => {
                sender.send_replace(bookings);
            }
            Err(err) => error!(%err, %room, "Failed to read bookings from Database"),
        }
    }
}

impl BookingStore for DatabaseInterface {
    fn booking_stream(&self, room: Room) -> WatchStream<Vec<Booking>> {
        // Other instances may have written since the last publish.
        if let Ok(mut connection) = self.lock() {
            self.send_bookings(&mut connection, room);
        }
        match self.senders.get(&room) {
            Some(sender) => WatchStream::new(sender.subscribe()),
            None => WatchStream::new(watch::channel(vec![]).1),
        }
    }

    fn bookings(&self, room: Room) -> Result<Vec<Booking>, StoreError> {
        let mut connection = self.lock()?;
        self.load_room(&mut connection, room).inspect_err(|err| {
            error!(%err, %room, "Failed to read bookings from Database");
        })
    }

    fn create_booking(&self, booking: NewBooking) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let start_time = time_column(&self.grid, booking.start_slot)?;
        let end_time = time_column(&self.grid, booking.end_slot)?;
        let mut connection = self.lock()?;

        let result = connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let overlapping: i64 = bookings::table
                    .filter(bookings::room.eq(booking.room.as_str()))
                    .filter(bookings::date.eq(booking.date))
                    .filter(bookings::start_time.lt(end_time))
                    .filter(bookings::end_time.gt(start_time))
                    .count()
                    .get_result(connection)?;
                if overlapping > 0 {
                    return Err(StoreError::Conflict);
                }

                diesel::insert_into(bookings::table)
                    .values(&NewBookingRow {
                        id,
                        room: booking.room.as_str(),
                        date: booking.date,
                        start_time,
                        end_time,
                        name: &booking.name,
                    })
                    .execute(connection)?;
                Ok(())
            });

        if let Err(err) = result {
            error!(%err, room = %booking.room, "Booking can't be created");
            return Err(err);
        }
        info!(%id, room = %booking.room, "Booking created");
        self.send_bookings(&mut connection, booking.room);
        Ok(id)
    }

    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let removed_room: Option<String> = diesel::delete(bookings::table.find(id))
            .returning(bookings::room)
            .get_result(&mut *connection)
            .optional()
            .inspect_err(|err| error!(%err, %id, "Deletion of booking failed"))?;

        let Some(room) = removed_room else {
            error!(%id, "Deletion failed. 0 database lines were changed");
            return Err(StoreError::NotFound(id));
        };
        info!(%id, %room, "Booking removed");
        match room.parse::<Room>() {
            Ok(room) => self.send_bookings(&mut connection, room),
            Err(err) => error!(%err, "Removed booking had an unknown room"),
        }
        Ok(())
    }
}
