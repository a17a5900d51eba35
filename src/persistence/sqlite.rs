use super::{EventStore, PersistenceError, PersistenceResult};
use crate::event::{CalendarEvent, EventSeries, NewCalendarEvent, NewEventSeries, SeriesId};
use crate::time::TimeOfDay;
use crate::validation;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

const EVENT_COLUMNS: &str =
    "id, title, event_date, event_time, event_end_time, event_kind, operation_type, series_id";
const SERIES_COLUMNS: &str = "id, name, operation_type, day_of_week, event_time, is_active";

pub struct SqliteEventStore {
    connection: Mutex<Connection>,
}

struct EventRow {
    id: i64,
    title: String,
    event_date: String,
    event_time: Option<String>,
    event_end_time: Option<String>,
    event_kind: String,
    operation_type: Option<String>,
    series_id: Option<i64>,
}

impl EventRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            event_date: row.get(2)?,
            event_time: row.get(3)?,
            event_end_time: row.get(4)?,
            event_kind: row.get(5)?,
            operation_type: row.get(6)?,
            series_id: row.get(7)?,
        })
    }

    fn into_event(self) -> PersistenceResult<CalendarEvent> {
        Ok(CalendarEvent {
            id: self.id,
            title: self.title,
            event_date: parse_date(&self.event_date)?,
            event_time: self.event_time,
            event_end_time: self.event_end_time,
            event_kind: self.event_kind.parse().map_err(PersistenceError::InvalidData)?,
            operation_type: self.operation_type,
            series_id: self.series_id,
        })
    }
}

struct SeriesRow {
    id: i64,
    name: String,
    operation_type: String,
    day_of_week: u8,
    event_time: Option<String>,
    is_active: bool,
}

impl SeriesRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            operation_type: row.get(2)?,
            day_of_week: row.get(3)?,
            event_time: row.get(4)?,
            is_active: row.get(5)?,
        })
    }

    fn into_series(self) -> PersistenceResult<EventSeries> {
        let event_time = match self.event_time {
            Some(raw) => Some(raw.parse::<TimeOfDay>().map_err(|err| {
                PersistenceError::InvalidData(format!("series {}: {err}", self.id))
            })?),
            None => None,
        };
        Ok(EventSeries {
            id: self.id,
            name: self.name,
            operation_type: self.operation_type,
            day_of_week: self.day_of_week,
            event_time,
            is_active: self.is_active,
        })
    }
}

fn parse_date(raw: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| PersistenceError::InvalidData(format!("bad event_date '{raw}': {err}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl SqliteEventStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS event_series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                operation_type TEXT NOT NULL,
                day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
                event_time TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                event_date TEXT NOT NULL,
                event_time TEXT,
                event_end_time TEXT,
                event_kind TEXT NOT NULL,
                operation_type TEXT,
                series_id INTEGER REFERENCES event_series(id)
            );
            CREATE INDEX IF NOT EXISTS events_by_date ON events (event_date);
            CREATE UNIQUE INDEX IF NOT EXISTS events_series_date
                ON events (series_id, event_date) WHERE series_id IS NOT NULL;
        "#;
        connection.execute_batch(ddl)?;
        tracing::debug!("sqlite event store schema ready");
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| PersistenceError::Poisoned)
    }

    fn query_events(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> PersistenceResult<Vec<CalendarEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, EventRow::read)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }
}

impl EventStore for SqliteEventStore {
    fn insert_event(&self, event: NewCalendarEvent) -> PersistenceResult<CalendarEvent> {
        validation::validate_new_event(&event)?;
        let conn = self.lock()?;
        if let Some(series_id) = event.series_id {
            let known = conn
                .query_row(
                    "SELECT 1 FROM event_series WHERE id = ?1",
                    params![series_id],
                    |_| Ok(()),
                )
                .optional()?;
            if known.is_none() {
                return Err(PersistenceError::UnknownSeries(series_id));
            }
        }
        let inserted = conn.execute(
            "INSERT INTO events (title, event_date, event_time, event_end_time, event_kind, operation_type, series_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.title,
                format_date(event.event_date),
                event.event_time,
                event.event_end_time,
                event.event_kind.as_str(),
                event.operation_type,
                event.series_id,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(PersistenceError::Duplicate {
                    series_id: event.series_id.unwrap_or_default(),
                    date: event.event_date,
                });
            }
            Err(err) => return Err(err.into()),
        }
        let id = conn.last_insert_rowid();
        Ok(event.into_event(id))
    }

    fn events_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PersistenceResult<Vec<CalendarEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_date BETWEEN ?1 AND ?2 ORDER BY event_date, id"
        );
        self.query_events(&sql, params![format_date(from), format_date(to)])
    }

    fn events_for_series(&self, series_id: SeriesId) -> PersistenceResult<Vec<CalendarEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE series_id = ?1 ORDER BY event_date, id"
        );
        self.query_events(&sql, params![series_id])
    }

    fn all_events(&self) -> PersistenceResult<Vec<CalendarEvent>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id");
        self.query_events(&sql, [])
    }

    fn insert_series(&self, series: NewEventSeries) -> PersistenceResult<EventSeries> {
        validation::validate_new_series(&series)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO event_series (name, operation_type, day_of_week, event_time, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                series.name,
                series.operation_type,
                series.day_of_week,
                series.event_time.map(|t| t.to_string()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(series.into_series(id))
    }

    fn find_series(&self, series_id: SeriesId) -> PersistenceResult<Option<EventSeries>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {SERIES_COLUMNS} FROM event_series WHERE id = ?1");
        let row = conn
            .query_row(&sql, params![series_id], SeriesRow::read)
            .optional()?;
        row.map(SeriesRow::into_series).transpose()
    }

    fn list_series(&self) -> PersistenceResult<Vec<EventSeries>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {SERIES_COLUMNS} FROM event_series ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], SeriesRow::read)?;
        let mut series = Vec::new();
        for row in rows {
            series.push(row?.into_series()?);
        }
        Ok(series)
    }

    fn set_series_active(&self, series_id: SeriesId, active: bool) -> PersistenceResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE event_series SET is_active = ?1 WHERE id = ?2",
            params![active, series_id],
        )?;
        Ok(changed > 0)
    }
}
