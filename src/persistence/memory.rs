use super::{CalendarSnapshot, EventStore, PersistenceError, PersistenceResult};
use crate::event::{
    CalendarEvent, EventId, EventSeries, NewCalendarEvent, NewEventSeries, SeriesId,
};
use crate::validation;
use chrono::NaiveDate;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    events: Vec<CalendarEvent>,
    series: Vec<EventSeries>,
    next_event_id: EventId,
    next_series_id: SeriesId,
}

/// Process-local store used by the CLI, the default HTTP server and tests.
#[derive(Default)]
pub struct MemoryEventStore {
    state: Mutex<MemoryState>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CalendarSnapshot) -> PersistenceResult<Self> {
        snapshot.validate()?;
        let next_event_id = snapshot.events.iter().map(|e| e.id).max().unwrap_or(0);
        let next_series_id = snapshot.series.iter().map(|s| s.id).max().unwrap_or(0);
        Ok(Self {
            state: Mutex::new(MemoryState {
                events: snapshot.events,
                series: snapshot.series,
                next_event_id,
                next_series_id,
            }),
        })
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| PersistenceError::Poisoned)
    }
}

fn sorted_by_date(mut events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    events.sort_by_key(|event| (event.event_date, event.id));
    events
}

impl EventStore for MemoryEventStore {
    fn insert_event(&self, event: NewCalendarEvent) -> PersistenceResult<CalendarEvent> {
        validation::validate_new_event(&event)?;
        let mut state = self.lock()?;
        if let Some(series_id) = event.series_id {
            if !state.series.iter().any(|s| s.id == series_id) {
                return Err(PersistenceError::UnknownSeries(series_id));
            }
            let taken = state
                .events
                .iter()
                .any(|e| e.series_id == Some(series_id) && e.event_date == event.event_date);
            if taken {
                return Err(PersistenceError::Duplicate {
                    series_id,
                    date: event.event_date,
                });
            }
        }
        state.next_event_id += 1;
        let stored = event.into_event(state.next_event_id);
        state.events.push(stored.clone());
        Ok(stored)
    }

    fn events_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PersistenceResult<Vec<CalendarEvent>> {
        let state = self.lock()?;
        let events = state
            .events
            .iter()
            .filter(|e| e.event_date >= from && e.event_date <= to)
            .cloned()
            .collect();
        Ok(sorted_by_date(events))
    }

    fn events_for_series(&self, series_id: SeriesId) -> PersistenceResult<Vec<CalendarEvent>> {
        let state = self.lock()?;
        let events = state
            .events
            .iter()
            .filter(|e| e.series_id == Some(series_id))
            .cloned()
            .collect();
        Ok(sorted_by_date(events))
    }

    fn all_events(&self) -> PersistenceResult<Vec<CalendarEvent>> {
        let state = self.lock()?;
        let mut events = state.events.clone();
        events.sort_by_key(|e| e.id);
        Ok(events)
    }

    fn insert_series(&self, series: NewEventSeries) -> PersistenceResult<EventSeries> {
        validation::validate_new_series(&series)?;
        let mut state = self.lock()?;
        state.next_series_id += 1;
        let stored = series.into_series(state.next_series_id);
        state.series.push(stored.clone());
        Ok(stored)
    }

    fn find_series(&self, series_id: SeriesId) -> PersistenceResult<Option<EventSeries>> {
        let state = self.lock()?;
        Ok(state.series.iter().find(|s| s.id == series_id).cloned())
    }

    fn list_series(&self) -> PersistenceResult<Vec<EventSeries>> {
        let state = self.lock()?;
        let mut series = state.series.clone();
        series.sort_by_key(|s| s.id);
        Ok(series)
    }

    fn set_series_active(&self, series_id: SeriesId, active: bool) -> PersistenceResult<bool> {
        let mut state = self.lock()?;
        match state.series.iter_mut().find(|s| s.id == series_id) {
            Some(series) => {
                series.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
