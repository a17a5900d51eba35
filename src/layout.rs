//! Lane layout for the day and week grids.
//!
//! Timed events of one date are packed greedily into lanes: events are taken
//! in ascending start order (stable on input order) and each one goes to the
//! lowest lane whose last event has ended by its start. Because a new lane is
//! only opened when every existing lane is busy at that instant, the lane
//! count equals the peak number of simultaneously running events.
//!
//! Geometry is expressed in minutes and lane fractions; converting to pixels
//! is left to the renderer.

use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::event::CalendarEvent;
use crate::interval::{EventInterval, interval_for};
use chrono::{NaiveDate, Timelike};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanedEvent {
    pub event: CalendarEvent,
    pub lane: usize,
    pub total_lanes: usize,
    pub start_minute: u32,
    pub end_minute: u32,
    pub top_offset_minutes: u32,
    pub height_minutes: u32,
}

impl LanedEvent {
    pub fn width_fraction(&self) -> f64 {
        1.0 / self.total_lanes as f64
    }

    pub fn left_fraction(&self) -> f64 {
        self.lane as f64 / self.total_lanes as f64
    }

    pub fn interval(&self) -> EventInterval {
        EventInterval {
            start_minute: self.start_minute,
            end_minute: self.end_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLayout {
    pub date: NaiveDate,
    pub all_day: Vec<CalendarEvent>,
    pub timed: Vec<LanedEvent>,
    pub total_lanes: usize,
}

/// Assigns lanes to the timed events of a single date.
///
/// All-day events are skipped. The result is ordered by start minute.
pub fn layout_day(events: &[CalendarEvent], config: &SchedulingConfig) -> Vec<LanedEvent> {
    let mut timed: Vec<(&CalendarEvent, EventInterval)> = events
        .iter()
        .filter_map(|event| interval_for(event, &config.durations).map(|iv| (event, iv)))
        .collect();
    timed.sort_by_key(|(_, interval)| interval.start_minute);

    let mut lane_ends: Vec<u32> = Vec::new();
    let mut placed = Vec::with_capacity(timed.len());
    for (event, interval) in timed {
        let lane = match lane_ends
            .iter()
            .position(|end| *end <= interval.start_minute)
        {
            Some(lane) => {
                lane_ends[lane] = interval.end_minute;
                lane
            }
            None => {
                lane_ends.push(interval.end_minute);
                lane_ends.len() - 1
            }
        };
        placed.push((event, interval, lane));
    }

    let total_lanes = lane_ends.len();
    placed
        .into_iter()
        .map(|(event, interval, lane)| LanedEvent {
            event: event.clone(),
            lane,
            total_lanes,
            start_minute: interval.start_minute,
            end_minute: interval.end_minute,
            top_offset_minutes: interval.start_minute,
            height_minutes: interval.visual_height(config.min_visual_minutes),
        })
        .collect()
}

fn build_day(date: NaiveDate, events: Vec<CalendarEvent>, config: &SchedulingConfig) -> DayLayout {
    let (all_day, timed_events): (Vec<_>, Vec<_>) =
        events.into_iter().partition(CalendarEvent::is_all_day);
    let timed = layout_day(&timed_events, config);
    let total_lanes = timed.first().map_or(0, |laned| laned.total_lanes);
    DayLayout {
        date,
        all_day,
        timed,
        total_lanes,
    }
}

/// Lays out every date in `[from, to]`, including dates without events.
/// Events outside the range are ignored.
pub fn layout_range(
    events: &[CalendarEvent],
    from: NaiveDate,
    to: NaiveDate,
    config: &SchedulingConfig,
) -> BTreeMap<NaiveDate, DayLayout> {
    let mut by_date: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    let mut day = from;
    while day <= to {
        by_date.insert(day, Vec::new());
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    for event in events {
        if let Some(bucket) = by_date.get_mut(&event.event_date) {
            bucket.push(event.clone());
        }
    }

    by_date
        .into_par_iter()
        .map(|(date, day_events)| (date, build_day(date, day_events, config)))
        .collect()
}

/// Largest number of intervals running at the same minute. Touching
/// intervals (`end == start`) do not overlap.
pub fn peak_concurrency(intervals: &[EventInterval]) -> usize {
    let mut edges: Vec<(u32, i32)> = Vec::with_capacity(intervals.len() * 2);
    for interval in intervals {
        edges.push((interval.start_minute, 1));
        edges.push((interval.end_minute, -1));
    }
    // ends sort before starts at the same minute
    edges.sort();

    let mut running = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        running += delta;
        peak = peak.max(running);
    }
    peak as usize
}

/// Minute offset of the "now" line when `date` is today.
pub fn time_cursor(clock: &dyn Clock, date: NaiveDate) -> Option<u32> {
    let now = clock.now();
    if now.date() != date {
        return None;
    }
    Some(now.hour() * 60 + now.minute())
}
