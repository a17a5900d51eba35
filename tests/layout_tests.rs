use chrono::{NaiveDate, NaiveDateTime};
use ops_calendar::layout::time_cursor;
use ops_calendar::time::format_minutes;
use ops_calendar::{
    CalendarEvent, EventKind, FixedClock, SchedulingConfig, interval_for, layout_day, layout_range,
    peak_concurrency,
};
use proptest::prelude::*;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timed(id: i64, kind: EventKind, time: &str) -> CalendarEvent {
    CalendarEvent::new(id, format!("event {id}"), d(2026, 10, 22), kind).with_time(time)
}

#[test]
fn meeting_overlapping_operation_uses_two_lanes() {
    let mut config = SchedulingConfig::default();
    config.durations.meeting = 90;
    let events = vec![
        timed(1, EventKind::Meeting, "09:00"),
        timed(2, EventKind::Operation, "10:00"),
    ];

    let laned = layout_day(&events, &config);
    assert_eq!(laned.len(), 2);
    assert_eq!(laned[0].event.id, 1);
    assert_eq!(laned[0].lane, 0);
    assert_eq!(laned[1].event.id, 2);
    assert_eq!(laned[1].lane, 1);
    assert!(laned.iter().all(|e| e.total_lanes == 2));
    assert_eq!(laned[0].width_fraction(), 0.5);
    assert_eq!(laned[1].left_fraction(), 0.5);
}

#[test]
fn back_to_back_events_share_a_lane() {
    let config = SchedulingConfig::default();
    // default meeting is 60 minutes, so it ends exactly when the next starts
    let events = vec![
        timed(1, EventKind::Meeting, "09:00"),
        timed(2, EventKind::Meeting, "10:00"),
    ];
    let laned = layout_day(&events, &config);
    assert!(laned.iter().all(|e| e.lane == 0 && e.total_lanes == 1));
}

#[test]
fn training_end_time_sets_duration() {
    let config = SchedulingConfig::default();
    let events = vec![
        timed(1, EventKind::Training, "09:00").with_end_time("09:05"),
        timed(2, EventKind::Training, "12:00").with_end_time("11:00"),
    ];
    let laned = layout_day(&events, &config);

    assert_eq!(laned[0].end_minute, 9 * 60 + 5);
    assert_eq!(laned[0].height_minutes, 15);
    // end before start falls back to the kind default of 90 minutes
    assert_eq!(laned[1].end_minute, 12 * 60 + 90);
}

#[test]
fn short_back_to_back_trainings_share_a_lane() {
    let config = SchedulingConfig::default();
    let events = vec![
        timed(1, EventKind::Training, "10:00").with_end_time("10:05"),
        timed(2, EventKind::Training, "10:05").with_end_time("10:10"),
    ];
    let laned = layout_day(&events, &config);

    // the 15 minute minimum height is drawn only, lanes follow real ends
    assert!(laned.iter().all(|e| e.lane == 0 && e.total_lanes == 1));
    assert!(laned.iter().all(|e| e.height_minutes == 15));
    assert_eq!(laned[0].end_minute, 10 * 60 + 5);
    assert_eq!(laned[1].end_minute, 10 * 60 + 10);
}

#[test]
fn equal_starts_keep_input_order() {
    let config = SchedulingConfig::default();
    let events = vec![
        timed(7, EventKind::Social, "18:00"),
        timed(3, EventKind::Operation, "18:00"),
        timed(5, EventKind::Meeting, "18:00"),
    ];
    let laned = layout_day(&events, &config);
    let ids: Vec<i64> = laned.iter().map(|e| e.event.id).collect();
    assert_eq!(ids, vec![7, 3, 5]);
    assert_eq!(
        laned.iter().map(|e| e.lane).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn range_layout_separates_all_day_events_and_fills_empty_days() {
    let config = SchedulingConfig::default();
    let events = vec![
        CalendarEvent::new(1, "Open day", d(2026, 10, 22), EventKind::Social),
        CalendarEvent::new(2, "Bad time", d(2026, 10, 22), EventKind::Meeting).with_time("25:99"),
        timed(3, EventKind::Operation, "18:00"),
        CalendarEvent::new(4, "Outside", d(2026, 11, 30), EventKind::Operation).with_time("10:00"),
    ];

    let days = layout_range(&events, d(2026, 10, 21), d(2026, 10, 23), &config);
    assert_eq!(days.len(), 3);

    let empty = &days[&d(2026, 10, 21)];
    assert!(empty.all_day.is_empty());
    assert!(empty.timed.is_empty());
    assert_eq!(empty.total_lanes, 0);

    let busy = &days[&d(2026, 10, 22)];
    let all_day_ids: Vec<i64> = busy.all_day.iter().map(|e| e.id).collect();
    assert_eq!(all_day_ids, vec![1, 2]);
    assert_eq!(busy.timed.len(), 1);
    assert_eq!(busy.total_lanes, 1);
    assert_eq!(busy.timed[0].top_offset_minutes, 18 * 60);
    assert_eq!(busy.timed[0].height_minutes, 180);

    assert!(days[&d(2026, 10, 23)].timed.is_empty());
}

#[test]
fn cursor_is_shown_only_on_today() {
    let now = NaiveDateTime::parse_from_str("2026-10-22 14:45", "%Y-%m-%d %H:%M").unwrap();
    let clock = FixedClock::new(now);
    assert_eq!(time_cursor(&clock, d(2026, 10, 22)), Some(14 * 60 + 45));
    assert_eq!(time_cursor(&clock, d(2026, 10, 23)), None);
}

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Operation),
        Just(EventKind::Training),
        Just(EventKind::Meeting),
        Just(EventKind::Social),
    ]
}

proptest! {
    #[test]
    fn lanes_never_hold_overlapping_events(
        specs in prop::collection::vec(
            (0u32..1440, kind_strategy(), prop::option::of(1u32..240)),
            0..24,
        )
    ) {
        let config = SchedulingConfig::default();
        let events: Vec<CalendarEvent> = specs
            .iter()
            .enumerate()
            .map(|(i, (start, kind, length))| {
                let event = timed(i as i64 + 1, *kind, &format_minutes(*start));
                match length {
                    Some(length) if start + length < 1440 => {
                        event.with_end_time(format_minutes(start + length))
                    }
                    _ => event,
                }
            })
            .collect();

        let laned = layout_day(&events, &config);
        prop_assert_eq!(laned.len(), events.len());

        for (i, a) in laned.iter().enumerate() {
            prop_assert!(a.lane < a.total_lanes);
            for b in laned.iter().skip(i + 1) {
                if a.lane == b.lane {
                    prop_assert!(!a.interval().overlaps(&b.interval()));
                }
            }
        }

        let intervals: Vec<_> = events
            .iter()
            .filter_map(|e| interval_for(e, &config.durations))
            .collect();
        let expected = peak_concurrency(&intervals);
        prop_assert!(laned.iter().all(|e| e.total_lanes == expected));
    }
}
