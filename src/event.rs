use crate::time::{TimeOfDay, parse_time};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EventId = i64;
pub type SeriesId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Operation,
    Training,
    Meeting,
    Social,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Operation,
        EventKind::Training,
        EventKind::Meeting,
        EventKind::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Operation => "operation",
            EventKind::Training => "training",
            EventKind::Meeting => "meeting",
            EventKind::Social => "social",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operation" | "op" => Ok(EventKind::Operation),
            "training" => Ok(EventKind::Training),
            "meeting" => Ok(EventKind::Meeting),
            "social" => Ok(EventKind::Social),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

/// A calendar row as handed over by the persistence layer.
///
/// Times are kept as the raw `HH:MM` strings the rows carry; an absent or
/// unparseable `event_time` makes the event all-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_end_time: Option<String>,
    pub event_kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
}

impl CalendarEvent {
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        event_date: NaiveDate,
        event_kind: EventKind,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            event_date,
            event_time: None,
            event_end_time: None,
            event_kind,
            operation_type: None,
            series_id: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.event_time = Some(time.into());
        self
    }

    pub fn with_end_time(mut self, time: impl Into<String>) -> Self {
        self.event_end_time = Some(time.into());
        self
    }

    pub fn start_minute(&self) -> Option<u32> {
        self.event_time.as_deref().and_then(parse_time)
    }

    pub fn is_all_day(&self) -> bool {
        self.start_minute().is_none()
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub event_end_time: Option<String>,
    pub event_kind: EventKind,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub series_id: Option<SeriesId>,
}

impl NewCalendarEvent {
    pub fn into_event(self, id: EventId) -> CalendarEvent {
        CalendarEvent {
            id,
            title: self.title,
            event_date: self.event_date,
            event_time: self.event_time,
            event_end_time: self.event_end_time,
            event_kind: self.event_kind,
            operation_type: self.operation_type,
            series_id: self.series_id,
        }
    }
}

/// Weekly recurrence rule that materialises Operation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSeries {
    pub id: SeriesId,
    pub name: String,
    pub operation_type: String,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<TimeOfDay>,
    pub is_active: bool,
}

impl EventSeries {
    pub fn weekday(&self) -> Option<Weekday> {
        weekday_from_sunday_index(self.day_of_week)
    }

    /// Event row for one occurrence of this series.
    pub fn occurrence(&self, date: NaiveDate) -> NewCalendarEvent {
        NewCalendarEvent {
            title: self.name.clone(),
            event_date: date,
            event_time: self.event_time.map(|t| t.to_string()),
            event_end_time: None,
            event_kind: EventKind::Operation,
            operation_type: Some(self.operation_type.clone()),
            series_id: Some(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEventSeries {
    pub name: String,
    pub operation_type: String,
    pub day_of_week: u8,
    #[serde(default)]
    pub event_time: Option<TimeOfDay>,
}

impl NewEventSeries {
    pub fn into_series(self, id: SeriesId) -> EventSeries {
        EventSeries {
            id,
            name: self.name,
            operation_type: self.operation_type,
            day_of_week: self.day_of_week,
            event_time: self.event_time,
            is_active: true,
        }
    }
}

pub fn weekday_from_sunday_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
