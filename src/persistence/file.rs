use super::{CalendarSnapshot, EventStore, PersistenceError, PersistenceResult};
use crate::event::{CalendarEvent, EventKind};
use crate::validation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    store: &dyn EventStore,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = store.snapshot()?;
    snapshot.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<CalendarSnapshot> {
    let file = File::open(path)?;
    let snapshot: CalendarSnapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[derive(Serialize, Deserialize)]
struct EventCsvRecord {
    id: i64,
    event_date: String,
    event_time: String,
    event_end_time: String,
    event_kind: String,
    title: String,
    operation_type: String,
    series_id: String,
}

impl From<&CalendarEvent> for EventCsvRecord {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            event_date: event.event_date.format("%Y-%m-%d").to_string(),
            event_time: event.event_time.clone().unwrap_or_default(),
            event_end_time: event.event_end_time.clone().unwrap_or_default(),
            event_kind: event.event_kind.as_str().to_string(),
            title: event.title.clone(),
            operation_type: event.operation_type.clone().unwrap_or_default(),
            series_id: event.series_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

impl EventCsvRecord {
    fn into_event(self) -> PersistenceResult<CalendarEvent> {
        let event_date = NaiveDate::parse_from_str(self.event_date.trim(), "%Y-%m-%d").map_err(
            |e| PersistenceError::InvalidData(format!("invalid date '{}': {e}", self.event_date)),
        )?;
        let event_kind: EventKind = self
            .event_kind
            .parse()
            .map_err(PersistenceError::InvalidData)?;
        let series_id = if self.series_id.trim().is_empty() {
            None
        } else {
            Some(self.series_id.trim().parse::<i64>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid series_id '{}': {e}", self.series_id))
            })?)
        };
        Ok(CalendarEvent {
            id: self.id,
            title: self.title,
            event_date,
            event_time: parse_string_option(self.event_time),
            event_end_time: parse_string_option(self.event_end_time),
            event_kind,
            operation_type: parse_string_option(self.operation_type),
            series_id,
        })
    }
}

pub fn save_events_to_csv<P: AsRef<Path>>(events: &[CalendarEvent], path: P) -> PersistenceResult<()> {
    validation::validate_event_collection(events)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for event in events {
        writer.serialize(EventCsvRecord::from(event))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_events_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<CalendarEvent>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut events = Vec::new();
    for record in reader.deserialize::<EventCsvRecord>() {
        events.push(record?.into_event()?);
    }
    validation::validate_event_collection(&events)?;
    Ok(events)
}

fn parse_string_option(input: String) -> Option<String> {
    if input.trim().is_empty() {
        None
    } else {
        Some(input)
    }
}
