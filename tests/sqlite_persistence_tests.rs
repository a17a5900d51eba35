#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use ops_calendar::{
    EventKind, EventStore, FixedClock, MemoryEventStore, NewCalendarEvent, NewEventSeries,
    PersistenceError, SchedulingConfig, SeriesEngine, SqliteEventStore, TimeOfDay,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn meeting(date: NaiveDate, time: Option<&str>) -> NewCalendarEvent {
    NewCalendarEvent {
        title: "Crew briefing".into(),
        event_date: date,
        event_time: time.map(str::to_string),
        event_end_time: None,
        event_kind: EventKind::Meeting,
        operation_type: None,
        series_id: None,
    }
}

fn wednesday_series() -> NewEventSeries {
    NewEventSeries {
        name: "Midweek ops".into(),
        operation_type: "training_op".into(),
        day_of_week: 3,
        event_time: Some(TimeOfDay::from_hm(19, 30).unwrap()),
    }
}

#[test]
fn sqlite_store_round_trips_events_and_series() {
    let file = NamedTempFile::new().unwrap();
    {
        let store = SqliteEventStore::new(file.path()).expect("open store");
        let stored = store
            .insert_event(meeting(d(2026, 10, 22), Some("09:00")))
            .expect("insert event");
        assert_eq!(stored.id, 1);
        store
            .insert_event(meeting(d(2026, 10, 25), None))
            .expect("insert all-day event");
        store.insert_series(wednesday_series()).expect("insert series");
    }

    let reopened = SqliteEventStore::new(file.path()).expect("reopen store");
    let events = reopened.all_events().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_time.as_deref(), Some("09:00"));
    assert_eq!(events[0].event_kind, EventKind::Meeting);
    assert!(events[1].is_all_day());

    let series = reopened.list_series().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, "Midweek ops");
    assert_eq!(series[0].event_time, TimeOfDay::from_hm(19, 30));
    assert!(series[0].is_active);
}

#[test]
fn range_query_is_inclusive_and_ordered() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    store.insert_event(meeting(d(2026, 10, 23), None)).unwrap();
    store.insert_event(meeting(d(2026, 10, 21), None)).unwrap();
    store.insert_event(meeting(d(2026, 10, 25), None)).unwrap();
    store.insert_event(meeting(d(2026, 10, 21), Some("08:00"))).unwrap();

    let events = store
        .events_in_range(d(2026, 10, 21), d(2026, 10, 23))
        .unwrap();
    let keys: Vec<(NaiveDate, i64)> = events.iter().map(|e| (e.event_date, e.id)).collect();
    assert_eq!(
        keys,
        vec![(d(2026, 10, 21), 2), (d(2026, 10, 21), 4), (d(2026, 10, 23), 1)]
    );
}

#[test]
fn second_event_for_series_and_date_is_a_duplicate() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    let series = store.insert_series(wednesday_series()).unwrap();
    let occurrence = series.occurrence(d(2026, 10, 21));

    store.insert_event(occurrence.clone()).unwrap();
    match store.insert_event(occurrence) {
        Err(PersistenceError::Duplicate { series_id, date }) => {
            assert_eq!(series_id, series.id);
            assert_eq!(date, d(2026, 10, 21));
        }
        other => panic!("expected duplicate error, got {other:?}"),
    }
    assert_eq!(store.events_for_series(series.id).unwrap().len(), 1);
}

#[test]
fn series_engine_runs_against_sqlite() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    let config = SchedulingConfig::default();
    let clock = FixedClock::at_date(d(2026, 10, 20));
    let engine = SeriesEngine::new(&store, &clock, &config);

    let created = engine.create_series(wednesday_series()).unwrap();
    assert_eq!(created.created, 8);
    assert_eq!(engine.ensure_extended(created.series.id).unwrap(), 0);

    let events = store.events_for_series(created.series.id).unwrap();
    assert_eq!(events[0].event_date, d(2026, 10, 21));
    assert_eq!(events[7].event_date, d(2026, 12, 9));

    engine.deactivate_series(created.series.id).unwrap();
    let stored = store.find_series(created.series.id).unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(!store.set_series_active(99, false).unwrap());
}

#[test]
fn invalid_rows_are_rejected_on_insert() {
    let store = SqliteEventStore::open_in_memory().unwrap();
    let mut bad = meeting(d(2026, 10, 22), Some("10:00"));
    bad.event_end_time = Some("09:00".into());
    assert!(matches!(
        store.insert_event(bad),
        Err(PersistenceError::InvalidData(_))
    ));
    assert!(store.all_events().unwrap().is_empty());
}

#[test]
fn both_stores_refuse_events_for_unknown_series() {
    let sqlite = SqliteEventStore::open_in_memory().unwrap();
    let memory = MemoryEventStore::new();
    let stores: [&dyn EventStore; 2] = [&sqlite, &memory];

    for store in stores {
        let mut orphan = meeting(d(2026, 10, 22), Some("10:00"));
        orphan.series_id = Some(99);
        assert!(matches!(
            store.insert_event(orphan),
            Err(PersistenceError::UnknownSeries(99))
        ));
        assert!(store.all_events().unwrap().is_empty());

        let series = store.insert_series(wednesday_series()).unwrap();
        let mut linked = meeting(d(2026, 10, 22), Some("10:00"));
        linked.series_id = Some(series.id);
        assert_eq!(store.insert_event(linked).unwrap().series_id, Some(series.id));
    }
}
