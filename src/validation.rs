use crate::event::{CalendarEvent, EventSeries, NewCalendarEvent, NewEventSeries};
use crate::time::parse_time;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn validate_times(
    label: &str,
    event_time: Option<&str>,
    event_end_time: Option<&str>,
) -> Result<(), ValidationError> {
    let start = match event_time {
        Some(raw) => Some(parse_time(raw).ok_or_else(|| {
            ValidationError::new(format!("{label} has malformed event_time '{raw}'"))
        })?),
        None => None,
    };

    if let Some(raw_end) = event_end_time {
        let end = parse_time(raw_end).ok_or_else(|| {
            ValidationError::new(format!("{label} has malformed event_end_time '{raw_end}'"))
        })?;
        let Some(start) = start else {
            return Err(ValidationError::new(format!(
                "{label} has an end time but no start time"
            )));
        };
        if end <= start {
            return Err(ValidationError::new(format!(
                "{label} end time {raw_end} must be after its start time"
            )));
        }
    }
    Ok(())
}

pub fn validate_new_event(event: &NewCalendarEvent) -> Result<(), ValidationError> {
    if event.title.trim().is_empty() {
        return Err(ValidationError::new("event requires a non-empty title"));
    }
    validate_times(
        &format!("event on {}", event.event_date),
        event.event_time.as_deref(),
        event.event_end_time.as_deref(),
    )
}

pub fn validate_event(event: &CalendarEvent) -> Result<(), ValidationError> {
    if event.title.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "event {} requires a non-empty title",
            event.id
        )));
    }
    validate_times(
        &format!("event {}", event.id),
        event.event_time.as_deref(),
        event.event_end_time.as_deref(),
    )
}

pub fn validate_new_series(series: &NewEventSeries) -> Result<(), ValidationError> {
    if series.name.trim().is_empty() {
        return Err(ValidationError::new("series requires a non-empty name"));
    }
    if series.operation_type.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "series '{}' requires an operation type",
            series.name
        )));
    }
    if series.day_of_week > 6 {
        return Err(ValidationError::new(format!(
            "series '{}' has day_of_week {} (expected 0=Sunday..6=Saturday)",
            series.name, series.day_of_week
        )));
    }
    Ok(())
}

pub fn validate_series(series: &EventSeries) -> Result<(), ValidationError> {
    if series.day_of_week > 6 {
        return Err(ValidationError::new(format!(
            "series {} has day_of_week {} (expected 0=Sunday..6=Saturday)",
            series.id, series.day_of_week
        )));
    }
    if series.name.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "series {} requires a non-empty name",
            series.id
        )));
    }
    Ok(())
}

/// Checks a loaded event collection: unique ids, valid rows and at most one
/// event per series and date.
pub fn validate_event_collection(events: &[CalendarEvent]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(events.len());
    let mut seen_occurrences = HashSet::new();
    for event in events {
        if !seen_ids.insert(event.id) {
            return Err(ValidationError::new(format!("duplicate event id {}", event.id)));
        }
        if let Some(series_id) = event.series_id {
            if !seen_occurrences.insert((series_id, event.event_date)) {
                return Err(ValidationError::new(format!(
                    "series {} has more than one event on {}",
                    series_id, event.event_date
                )));
            }
        }
        validate_event(event)?;
    }
    Ok(())
}

pub fn validate_series_collection(series: &[EventSeries]) -> Result<(), ValidationError> {
    let mut seen_ids = HashSet::with_capacity(series.len());
    for entry in series {
        if !seen_ids.insert(entry.id) {
            return Err(ValidationError::new(format!("duplicate series id {}", entry.id)));
        }
        validate_series(entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn end_time_must_follow_start() {
        let event = CalendarEvent::new(1, "Drill", day(), EventKind::Training)
            .with_time("19:00")
            .with_end_time("18:30");
        let err = validate_event(&event).unwrap_err();
        assert!(err.to_string().contains("must be after"));
    }

    #[test]
    fn malformed_start_is_rejected() {
        let event = CalendarEvent::new(1, "Drill", day(), EventKind::Training).with_time("7pm");
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn duplicate_series_dates_are_rejected() {
        let mut first = CalendarEvent::new(1, "Op", day(), EventKind::Operation);
        first.series_id = Some(3);
        let mut second = first.clone();
        second.id = 2;
        let err = validate_event_collection(&[first, second]).unwrap_err();
        assert!(err.to_string().contains("more than one event"));
    }

    #[test]
    fn series_weekday_range_is_enforced() {
        let series = NewEventSeries {
            name: "Ops".into(),
            operation_type: "Combat".into(),
            day_of_week: 7,
            event_time: None,
        };
        assert!(validate_new_series(&series).is_err());
    }
}
