//! Weekly recurring series and their rolling horizon of materialised events.
//!
//! A series is `Active` until deactivated, which is terminal: nothing more is
//! generated and already generated events stay as they are. While active,
//! [`SeriesEngine::ensure_extended`] keeps at least `rolling_horizon` events
//! dated today or later. New dates always continue from the latest generated
//! date, so repeated calls never produce a second event for one date.

use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::event::{EventSeries, NewEventSeries, SeriesId};
use crate::persistence::{EventStore, PersistenceError};
use crate::validation::{self, ValidationError};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;

const WEEK: Days = Days::new(7);

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series {0} not found")]
    NotFound(SeriesId),
    #[error("invalid series: {0}")]
    Invalid(#[from] ValidationError),
    #[error(
        "series {series_id}: stored {created} of {requested} events before persistence failed: {source}"
    )]
    Persistence {
        series_id: SeriesId,
        created: usize,
        requested: usize,
        source: PersistenceError,
    },
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

pub type SeriesResult<T> = Result<T, SeriesError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesState {
    Active,
    Deactivated,
}

impl From<&EventSeries> for SeriesState {
    fn from(series: &EventSeries) -> Self {
        if series.is_active {
            SeriesState::Active
        } else {
            SeriesState::Deactivated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSeries {
    pub series: EventSeries,
    pub created: usize,
}

/// First date on or after `today` that falls on `weekday`; today itself
/// counts when it matches.
pub fn first_occurrence(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let target = weekday.num_days_from_sunday();
    let current = today.weekday().num_days_from_sunday();
    let offset = (7 + target - current) % 7;
    today + Days::new(u64::from(offset))
}

/// `count` dates starting at `start`, seven days apart.
pub fn weekly_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    std::iter::successors(Some(start), |date| date.checked_add_days(WEEK))
        .take(count)
        .collect()
}

/// Dates that must be generated so at least `horizon` of them are on or
/// after `today`, given the dates the series already has.
///
/// Generation continues one week after the latest existing date. If that is
/// already in the past it keeps stepping weekly until it reaches today, so
/// the weekday cadence holds and no past events are created.
pub fn plan_extension(
    existing: &[NaiveDate],
    weekday: Weekday,
    today: NaiveDate,
    horizon: usize,
) -> Vec<NaiveDate> {
    let future = existing.iter().filter(|date| **date >= today).count();
    if future >= horizon {
        return Vec::new();
    }
    let start = match existing.iter().max() {
        Some(latest) => {
            let mut next = *latest + WEEK;
            while next < today {
                next = next + WEEK;
            }
            next
        }
        None => first_occurrence(today, weekday),
    };
    weekly_dates(start, horizon - future)
}

pub struct SeriesEngine<'a> {
    store: &'a dyn EventStore,
    clock: &'a dyn Clock,
    horizon: usize,
}

impl<'a> SeriesEngine<'a> {
    pub fn new(store: &'a dyn EventStore, clock: &'a dyn Clock, config: &SchedulingConfig) -> Self {
        Self {
            store,
            clock,
            horizon: config.rolling_horizon,
        }
    }

    /// Stores the series and eagerly generates its first batch of events.
    pub fn create_series(&self, new_series: NewEventSeries) -> SeriesResult<CreatedSeries> {
        validation::validate_new_series(&new_series)?;
        let series = self.store.insert_series(new_series)?;
        tracing::info!(series_id = series.id, name = %series.name, "created event series");
        let created = self.extend_series(&series)?;
        Ok(CreatedSeries { series, created })
    }

    pub fn ensure_extended(&self, series_id: SeriesId) -> SeriesResult<usize> {
        let series = self
            .store
            .find_series(series_id)?
            .ok_or(SeriesError::NotFound(series_id))?;
        self.extend_series(&series)
    }

    /// Tops up the rolling horizon of one series. Returns the number of new
    /// events; inactive series are left alone.
    pub fn extend_series(&self, series: &EventSeries) -> SeriesResult<usize> {
        if SeriesState::from(series) == SeriesState::Deactivated {
            return Ok(0);
        }
        let weekday = series.weekday().ok_or_else(|| {
            ValidationError::new(format!(
                "series {} has day_of_week {} (expected 0=Sunday..6=Saturday)",
                series.id, series.day_of_week
            ))
        })?;

        let today = self.clock.today();
        let existing: Vec<NaiveDate> = self
            .store
            .events_for_series(series.id)?
            .into_iter()
            .map(|event| event.event_date)
            .collect();
        let planned = plan_extension(&existing, weekday, today, self.horizon);
        if planned.is_empty() {
            return Ok(0);
        }
        self.materialize(series, &planned)
    }

    /// Extends every active series; stops at the first failure.
    pub fn ensure_all_extended(&self) -> SeriesResult<usize> {
        let mut total = 0;
        for series in self.store.list_series()? {
            if series.is_active {
                total += self.extend_series(&series)?;
            }
        }
        Ok(total)
    }

    pub fn deactivate_series(&self, series_id: SeriesId) -> SeriesResult<()> {
        if !self.store.set_series_active(series_id, false)? {
            return Err(SeriesError::NotFound(series_id));
        }
        tracing::info!(series_id, "deactivated event series");
        Ok(())
    }

    fn materialize(&self, series: &EventSeries, dates: &[NaiveDate]) -> SeriesResult<usize> {
        let mut created = 0;
        for date in dates {
            match self.store.insert_event(series.occurrence(*date)) {
                Ok(_) => created += 1,
                Err(PersistenceError::Duplicate { .. }) => {
                    // another writer generated this occurrence first
                    tracing::debug!(series_id = series.id, %date, "occurrence already exists");
                }
                Err(source) => {
                    tracing::warn!(
                        series_id = series.id,
                        %date,
                        created,
                        error = %source,
                        "series extension aborted"
                    );
                    return Err(SeriesError::Persistence {
                        series_id: series.id,
                        created,
                        requested: dates.len(),
                        source,
                    });
                }
            }
        }
        tracing::info!(
            series_id = series.id,
            created,
            horizon = self.horizon,
            "extended event series"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn first_occurrence_is_inclusive_of_today() {
        // 2026-10-17 is a Saturday
        assert_eq!(first_occurrence(d(2026, 10, 17), Weekday::Sat), d(2026, 10, 17));
        assert_eq!(first_occurrence(d(2026, 10, 18), Weekday::Sat), d(2026, 10, 24));
        assert_eq!(first_occurrence(d(2026, 10, 13), Weekday::Sun), d(2026, 10, 18));
    }

    #[test]
    fn plan_is_empty_when_horizon_is_met() {
        let existing = weekly_dates(d(2026, 10, 17), 8);
        assert!(plan_extension(&existing, Weekday::Sat, d(2026, 10, 17), 8).is_empty());
    }

    #[test]
    fn plan_skips_past_weeks_after_a_long_gap() {
        let existing = [d(2026, 1, 3)];
        let plan = plan_extension(&existing, Weekday::Sat, d(2026, 10, 14), 3);
        assert_eq!(plan, vec![d(2026, 10, 17), d(2026, 10, 24), d(2026, 10, 31)]);
    }

    #[test]
    fn past_events_do_not_count_towards_horizon() {
        let existing = [d(2026, 10, 3), d(2026, 10, 10), d(2026, 10, 17)];
        let plan = plan_extension(&existing, Weekday::Sat, d(2026, 10, 16), 2);
        assert_eq!(plan, vec![d(2026, 10, 24)]);
    }
}
