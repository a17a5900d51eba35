use chrono::{NaiveDate, NaiveDateTime};
use ops_calendar::slots::{filter_available, find_conflict};
use ops_calendar::{
    CalendarEvent, EventKind, FixedClock, SchedulingConfig, SlotFinder, SlotGrid, TimeOfDay,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn at(s: &str) -> FixedClock {
    FixedClock::new(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap())
}

fn op(id: i64, date: NaiveDate, time: &str) -> CalendarEvent {
    CalendarEvent::new(id, format!("op {id}"), date, EventKind::Operation).with_time(time)
}

#[test]
fn three_and_a_half_hour_window_around_existing_operation() {
    let existing = [t("18:00")];
    assert_eq!(find_conflict("21:00", &existing, 210), Some(t("18:00")));
    assert_eq!(find_conflict("21:30", &existing, 210), None);
    assert_eq!(find_conflict("14:30", &existing, 210), None);
}

#[test]
fn loosely_typed_times_report_no_conflict() {
    let existing = [t("12:00")];
    assert_eq!(find_conflict("12:5", &existing, 210), None);
    assert_eq!(find_conflict("9:3", &existing, 210), None);
    assert_eq!(find_conflict("12:05", &existing, 210), Some(t("12:00")));
}

#[test]
fn filtering_keeps_grid_order() {
    let grid = SlotGrid::default().candidates();
    let available = filter_available(&grid, &[t("18:00")], 210);
    assert_eq!(available.first().copied(), Some(t("10:00")));
    assert!(available.contains(&t("14:30")));
    assert!(!available.contains(&t("15:00")));
    assert!(!available.contains(&t("21:00")));
    assert!(available.contains(&t("21:30")));
    // 13 half-hour slots from 15:00 to 21:00 are blocked
    assert_eq!(available.len(), 28 - 13);
    assert!(available.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn future_date_offers_whole_grid_minus_conflicts() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 12:00");
    let date = d(2026, 10, 24);
    let events = vec![
        op(1, date, "18:00"),
        CalendarEvent::new(2, "Briefing", date, EventKind::Meeting).with_time("12:00"),
        op(3, d(2026, 10, 25), "12:00"),
    ];

    let availability = SlotFinder::new(&config, &clock).suggest(date, &events);
    assert_eq!(availability.existing_times, vec!["18:00".to_string()]);
    assert_eq!(availability.available.len(), 15);
    assert!(availability.available.contains(&"12:00".to_string()));
}

#[test]
fn today_only_offers_slots_after_now() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 18:10");
    let availability = SlotFinder::new(&config, &clock).suggest(d(2026, 10, 20), &[]);
    assert_eq!(availability.available.first().map(String::as_str), Some("18:30"));
    assert_eq!(availability.available.len(), 11);
}

#[test]
fn past_date_offers_nothing() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 08:00");
    let availability = SlotFinder::new(&config, &clock).suggest(d(2026, 10, 19), &[]);
    assert!(availability.available.is_empty());
}

#[test]
fn editing_an_operation_ignores_its_own_start() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 08:00");
    let date = d(2026, 10, 24);
    let events = vec![op(1, date, "18:00")];

    let finder = SlotFinder::new(&config, &clock);
    let editing = finder.suggest_excluding(date, &events, Some(1));
    assert!(editing.existing_times.is_empty());
    assert_eq!(editing.available.len(), 28);
}

#[test]
fn check_reports_first_conflicting_operation() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 08:00");
    let date = d(2026, 10, 24);
    let events = vec![op(1, date, "18:00"), op(2, date, "20:00")];
    let finder = SlotFinder::new(&config, &clock);

    assert_eq!(finder.check("19:00", date, &events, None), Some(t("18:00")));
    assert_eq!(finder.check("23:30", date, &events, None), None);
    assert_eq!(finder.check("not a time", date, &events, None), None);
}

#[test]
fn rechecking_an_edited_operation_skips_itself() {
    let config = SchedulingConfig::default();
    let clock = at("2026-10-20 08:00");
    let date = d(2026, 10, 24);
    let events = vec![op(1, date, "18:00"), op(2, date, "12:00")];
    let finder = SlotFinder::new(&config, &clock);

    assert_eq!(finder.check("18:30", date, &events, Some(1)), None);
    // other operations still count
    assert_eq!(finder.check("14:00", date, &events, Some(1)), Some(t("12:00")));
    assert_eq!(finder.check("18:30", date, &events, Some(2)), Some(t("18:00")));
}

#[test]
fn custom_separation_from_config() {
    let mut config = SchedulingConfig::default();
    config.min_separation_minutes = 60;
    let clock = at("2026-10-20 08:00");
    let date = d(2026, 10, 24);
    let events = vec![op(1, date, "18:00")];

    let finder = SlotFinder::new(&config, &clock);
    assert_eq!(finder.check("19:00", date, &events, None), None);
    assert_eq!(finder.check("18:30", date, &events, None), Some(t("18:00")));
}
