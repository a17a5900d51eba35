use crate::event::{CalendarEvent, EventSeries, NewCalendarEvent, NewEventSeries, SeriesId};
use crate::validation::{self, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("series {0} does not exist")]
    UnknownSeries(SeriesId),
    #[error("series {series_id} already has an event on {date}")]
    Duplicate { series_id: SeriesId, date: NaiveDate },
    #[error("record not found")]
    NotFound,
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<ValidationError> for PersistenceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Everything a store holds, in id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    #[serde(default)]
    pub series: Vec<EventSeries>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl CalendarSnapshot {
    pub fn validate(&self) -> PersistenceResult<()> {
        validation::validate_series_collection(&self.series)?;
        validation::validate_event_collection(&self.events)?;
        Ok(())
    }
}

/// Storage contract the engines read from and write to.
///
/// Inserting an event whose `series_id` names no stored series must fail with
/// [`PersistenceError::UnknownSeries`]; inserting one for a
/// `(series_id, event_date)` pair that already exists must fail with
/// [`PersistenceError::Duplicate`].
pub trait EventStore: Send + Sync {
    fn insert_event(&self, event: NewCalendarEvent) -> PersistenceResult<CalendarEvent>;
    /// Events with `from <= event_date <= to`, ordered by date then id.
    fn events_in_range(&self, from: NaiveDate, to: NaiveDate)
    -> PersistenceResult<Vec<CalendarEvent>>;
    /// Events generated by a series, ordered by date.
    fn events_for_series(&self, series_id: SeriesId) -> PersistenceResult<Vec<CalendarEvent>>;
    fn all_events(&self) -> PersistenceResult<Vec<CalendarEvent>>;

    fn insert_series(&self, series: NewEventSeries) -> PersistenceResult<EventSeries>;
    fn find_series(&self, series_id: SeriesId) -> PersistenceResult<Option<EventSeries>>;
    fn list_series(&self) -> PersistenceResult<Vec<EventSeries>>;
    /// Returns `false` when no series has that id.
    fn set_series_active(&self, series_id: SeriesId, active: bool) -> PersistenceResult<bool>;

    fn snapshot(&self) -> PersistenceResult<CalendarSnapshot> {
        Ok(CalendarSnapshot {
            series: self.list_series()?,
            events: self.all_events()?,
        })
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_events_from_csv, load_snapshot_from_json, save_events_to_csv, save_snapshot_to_json,
};
pub use memory::MemoryEventStore;
