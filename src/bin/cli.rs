use chrono::{NaiveDate, NaiveDateTime};
use ops_calendar::layout::{DayLayout, layout_range};
use ops_calendar::time::format_minutes;
use ops_calendar::{
    CalendarEvent, CalendarSnapshot, Clock, EventKind, EventStore, FixedClock, MemoryEventStore,
    NewCalendarEvent, NewEventSeries, SchedulingConfig, SeriesEngine, SlotFinder, SystemClock,
    TimeOfDay, load_events_from_csv, load_snapshot_from_json, save_events_to_csv,
    save_snapshot_to_json,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

struct Session {
    store: MemoryEventStore,
    config: SchedulingConfig,
    pinned_now: Option<NaiveDateTime>,
}

impl Session {
    fn clock(&self) -> Box<dyn Clock> {
        match self.pinned_now {
            Some(now) => Box::new(FixedClock::new(now)),
            None => Box::new(SystemClock),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `-` for all-day, `HH:MM`, or `HH:MM-HH:MM`.
fn parse_time_token(token: &str) -> Result<(Option<String>, Option<String>), String> {
    if token == "-" {
        return Ok((None, None));
    }
    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (start, Some(end)),
        None => (token, None),
    };
    let start: TimeOfDay = start.parse().map_err(|e| format!("{e}"))?;
    let end = match end {
        Some(end) => Some(end.parse::<TimeOfDay>().map_err(|e| format!("{e}"))?),
        None => None,
    };
    Ok((Some(start.to_string()), end.map(|t| t.to_string())))
}

fn describe_event(event: &CalendarEvent) -> String {
    let time = match (&event.event_time, &event.event_end_time) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => start.clone(),
        _ => "all-day".to_string(),
    };
    let series = event
        .series_id
        .map(|id| format!(" [series {id}]"))
        .unwrap_or_default();
    format!(
        "#{:<4} {} {:<11} {:<9} {}{}",
        event.id, event.event_date, time, event.event_kind, event.title, series
    )
}

fn render_day(day: &DayLayout) -> String {
    let mut out = format!("{} ({} lanes)\n", day.date, day.total_lanes);
    for event in &day.all_day {
        out.push_str(&format!(
            "  all-day      {:<9} {}\n",
            event.event_kind, event.title
        ));
    }
    for laned in &day.timed {
        out.push_str(&format!(
            "  [{}/{}] {}-{} {:<9} {}\n",
            laned.lane + 1,
            laned.total_lanes,
            format_minutes(laned.start_minute),
            format_minutes(laned.end_minute),
            laned.event.event_kind,
            laned.event.title
        ));
    }
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  today [YYYY-MM-DD [HH:MM]]             Show or pin the current date\n  today system                           Follow the system clock again\n  add <date> <kind> <time> <title...>    Add event (time: -, HH:MM or HH:MM-HH:MM)\n  events <from> [to]                     List events\n  layout <from> [to]                     Show lane layout per day\n  slots <date>                           Suggest Operation start times\n  check <date> <HH:MM>                   Check a start time against existing Operations\n  series new <dow 0-6> <time> <op_type> <name...>\n                                         Create weekly series (time: - or HH:MM)\n  series list                            List series\n  series extend <id>                     Top up one series\n  series stop <id>                       Deactivate a series\n  extend                                 Top up every active series\n  config show                            Show scheduling config\n  config set <json_path>                 Load scheduling config from JSON file\n  config save <json_path>                Save scheduling config to JSON file\n  save <json|csv> <path>                 Persist calendar to disk\n  load <json|csv> <path>                 Load calendar from disk\n  quit|exit                              Exit"
    );
}

fn handle_add(session: &Session, args: &[&str]) {
    let [date_s, kind_s, time_s, title @ ..] = args else {
        println!("Usage: add <date> <kind> <time> <title...>");
        return;
    };
    if title.is_empty() {
        println!("Usage: add <date> <kind> <time> <title...>");
        return;
    }
    let Some(event_date) = parse_date(date_s) else {
        println!("Invalid date (YYYY-MM-DD)");
        return;
    };
    let event_kind: EventKind = match kind_s.parse() {
        Ok(kind) => kind,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    let (event_time, event_end_time) = match parse_time_token(time_s) {
        Ok(times) => times,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    if let (EventKind::Operation, Some(start)) = (event_kind, event_time.as_deref()) {
        let clock = session.clock();
        match session.store.events_in_range(event_date, event_date) {
            Ok(same_day) => {
                if let Some(conflict) = SlotFinder::new(&session.config, clock.as_ref())
                    .check(start, event_date, &same_day, None)
                {
                    println!(
                        "Warning: {start} is within {} minutes of the Operation at {conflict}.",
                        session.config.min_separation_minutes
                    );
                }
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    let event = NewCalendarEvent {
        title: title.join(" "),
        event_date,
        event_time,
        event_end_time,
        event_kind,
        operation_type: None,
        series_id: None,
    };
    match session.store.insert_event(event) {
        Ok(stored) => println!("Added {}", describe_event(&stored)),
        Err(e) => println!("Error: {e}"),
    }
}

fn parse_range(args: &[&str]) -> Option<(NaiveDate, NaiveDate)> {
    let from = parse_date(args.first()?)?;
    let to = match args.get(1) {
        Some(s) => parse_date(s)?,
        None => from,
    };
    Some((from, to))
}

fn handle_series(session: &Session, args: &[&str]) {
    let clock = session.clock();
    let engine = SeriesEngine::new(&session.store, clock.as_ref(), &session.config);
    match args {
        ["new", dow_s, time_s, op_type, name @ ..] if !name.is_empty() => {
            let Ok(day_of_week) = dow_s.parse::<u8>() else {
                println!("Invalid day of week (0=Sunday..6=Saturday)");
                return;
            };
            let event_time = if *time_s == "-" {
                None
            } else {
                match time_s.parse::<TimeOfDay>() {
                    Ok(t) => Some(t),
                    Err(e) => {
                        println!("{e}");
                        return;
                    }
                }
            };
            let new_series = NewEventSeries {
                name: name.join(" "),
                operation_type: op_type.to_string(),
                day_of_week,
                event_time,
            };
            match engine.create_series(new_series) {
                Ok(created) => println!(
                    "Created series {} '{}' with {} events.",
                    created.series.id, created.series.name, created.created
                ),
                Err(e) => println!("Error: {e}"),
            }
        }
        ["list"] => match session.store.list_series() {
            Ok(series) if series.is_empty() => println!("No series."),
            Ok(series) => {
                for entry in series {
                    let time = entry
                        .event_time
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "all-day".into());
                    println!(
                        "#{:<4} {:<24} {:<12} dow={} {} {}",
                        entry.id,
                        entry.name,
                        entry.operation_type,
                        entry.day_of_week,
                        time,
                        if entry.is_active { "active" } else { "inactive" }
                    );
                }
            }
            Err(e) => println!("Error: {e}"),
        },
        ["extend", id_s] => match id_s.parse::<i64>() {
            Ok(id) => match engine.ensure_extended(id) {
                Ok(created) => println!("Series {id}: created {created} events."),
                Err(e) => println!("Error: {e}"),
            },
            Err(_) => println!("Invalid id"),
        },
        ["stop", id_s] => match id_s.parse::<i64>() {
            Ok(id) => match engine.deactivate_series(id) {
                Ok(()) => println!("Series {id} deactivated."),
                Err(e) => println!("Error: {e}"),
            },
            Err(_) => println!("Invalid id"),
        },
        _ => println!(
            "Usage: series new <dow 0-6> <time> <op_type> <name...> | series list | series extend <id> | series stop <id>"
        ),
    }
}

fn handle_config(session: &mut Session, args: &[&str]) {
    match args {
        ["show"] => match serde_json::to_string_pretty(&session.config) {
            Ok(json) => println!("{json}"),
            Err(e) => println!("Error: {e}"),
        },
        ["set", path] => match SchedulingConfig::from_json_file(path) {
            Ok(config) => {
                session.config = config;
                println!("Config loaded from {path}.");
            }
            Err(e) => println!("Error: {e}"),
        },
        ["save", path] => match session.config.save_json_file(path) {
            Ok(()) => println!("Config saved to {path}."),
            Err(e) => println!("Error: {e}"),
        },
        _ => println!("Usage: config show | config set <json_path> | config save <json_path>"),
    }
}

fn handle_save(session: &Session, args: &[&str]) {
    let result = match args {
        ["json", path] => save_snapshot_to_json(&session.store, path),
        ["csv", path] => session
            .store
            .all_events()
            .and_then(|events| save_events_to_csv(&events, path)),
        _ => {
            println!("Usage: save <json|csv> <path>");
            return;
        }
    };
    match result {
        Ok(()) => println!("Calendar saved to {}.", args[1]),
        Err(e) => println!("Error: {e}"),
    }
}

fn handle_load(session: &mut Session, args: &[&str]) {
    let snapshot = match args {
        ["json", path] => load_snapshot_from_json(path),
        ["csv", path] => load_events_from_csv(path).map(|events| CalendarSnapshot {
            series: Vec::new(),
            events,
        }),
        _ => {
            println!("Usage: load <json|csv> <path>");
            return;
        }
    };
    match snapshot.and_then(MemoryEventStore::from_snapshot) {
        Ok(store) => {
            session.store = store;
            println!("Calendar loaded from {}.", args[1]);
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn handle_today(session: &mut Session, args: &[&str]) {
    match args {
        [] => {}
        ["system"] => session.pinned_now = None,
        [date_s] => match parse_date(date_s) {
            Some(date) => session.pinned_now = Some(date.and_time(chrono::NaiveTime::MIN)),
            None => {
                println!("Invalid date (YYYY-MM-DD)");
                return;
            }
        },
        [date_s, time_s] => match (parse_date(date_s), time_s.parse::<TimeOfDay>()) {
            (Some(date), Ok(time)) => session.pinned_now = Some(date.and_time(time.to_naive_time())),
            _ => {
                println!("Usage: today [YYYY-MM-DD [HH:MM]]");
                return;
            }
        },
        _ => {
            println!("Usage: today [YYYY-MM-DD [HH:MM]]");
            return;
        }
    }
    let now = session.clock().now();
    println!("Today is {} {}", now.date(), now.format("%H:%M"));
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match SchedulingConfig::from_env_path("OPS_CALENDAR_CONFIG") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring OPS_CALENDAR_CONFIG: {e}");
            SchedulingConfig::default()
        }
    };
    let mut session = Session {
        store: MemoryEventStore::new(),
        config,
        pinned_now: None,
    };

    println!("Ops Calendar (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let (cmd, args) = (parts[0], &parts[1..]);

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "today" => handle_today(&mut session, args),
            "add" => handle_add(&session, args),
            "events" => match parse_range(args) {
                Some((from, to)) => match session.store.events_in_range(from, to) {
                    Ok(events) if events.is_empty() => println!("No events."),
                    Ok(events) => {
                        for event in &events {
                            println!("{}", describe_event(event));
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: events <from> [to]"),
            },
            "layout" => match parse_range(args) {
                Some((from, to)) => {
                    let clock = session.clock();
                    let engine = SeriesEngine::new(&session.store, clock.as_ref(), &session.config);
                    if let Err(e) = engine.ensure_all_extended() {
                        println!("Error: {e}");
                    }
                    match session.store.events_in_range(from, to) {
                        Ok(events) => {
                            for day in layout_range(&events, from, to, &session.config).values() {
                                print!("{}", render_day(day));
                            }
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                None => println!("Usage: layout <from> [to]"),
            },
            "slots" => match args.first().and_then(|s| parse_date(s)) {
                Some(date) => match session.store.events_in_range(date, date) {
                    Ok(events) => {
                        let clock = session.clock();
                        let availability =
                            SlotFinder::new(&session.config, clock.as_ref()).suggest(date, &events);
                        println!("Existing: {}", availability.existing_times.join(", "));
                        println!("Available: {}", availability.available.join(", "));
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: slots <date>"),
            },
            "check" => match (args.first().and_then(|s| parse_date(s)), args.get(1)) {
                (Some(date), Some(time)) => match session.store.events_in_range(date, date) {
                    Ok(events) => {
                        let clock = session.clock();
                        match SlotFinder::new(&session.config, clock.as_ref())
                            .check(time, date, &events, None)
                        {
                            Some(conflict) => println!("Conflicts with Operation at {conflict}."),
                            None => println!("No conflict."),
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                },
                _ => println!("Usage: check <date> <HH:MM>"),
            },
            "series" => handle_series(&session, args),
            "extend" => {
                let clock = session.clock();
                let engine = SeriesEngine::new(&session.store, clock.as_ref(), &session.config);
                match engine.ensure_all_extended() {
                    Ok(created) => println!("Created {created} events."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "config" => handle_config(&mut session, args),
            "save" => handle_save(&session, args),
            "load" => handle_load(&mut session, args),
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
