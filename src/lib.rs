pub mod clock;
pub mod config;
pub mod event;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod interval;
pub mod layout;
pub mod persistence;
pub mod series;
pub mod slots;
pub mod time;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, KindDurations, SchedulingConfig};
pub use event::{
    CalendarEvent, EventId, EventKind, EventSeries, NewCalendarEvent, NewEventSeries, SeriesId,
};
pub use interval::{EventInterval, interval_for};
pub use layout::{DayLayout, LanedEvent, layout_day, layout_range, peak_concurrency};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteEventStore;
pub use persistence::{
    CalendarSnapshot, EventStore, MemoryEventStore, PersistenceError, PersistenceResult,
    load_events_from_csv, load_snapshot_from_json, save_events_to_csv, save_snapshot_to_json,
};
pub use series::{CreatedSeries, SeriesEngine, SeriesError, SeriesState};
pub use slots::{SlotAvailability, SlotFinder, SlotGrid};
pub use time::TimeOfDay;
pub use validation::ValidationError;
