use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::layout::{self, DayLayout};
use crate::slots::{SlotAvailability, SlotFinder};
use crate::{
    CalendarEvent, Clock, CreatedSeries, EventId, EventKind, EventSeries, EventStore,
    NewCalendarEvent, NewEventSeries, PersistenceError, SchedulingConfig, SeriesEngine,
    SeriesError, SeriesId,
};

/// Longest range a single layout or listing request may cover.
const MAX_RANGE_DAYS: i64 = 62;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    config: Arc<RwLock<SchedulingConfig>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config: Arc::new(RwLock::new(config)),
        }
    }

    fn config(&self) -> SchedulingConfig {
        self.config.read().clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(message) => ApiError::Invalid(message),
            PersistenceError::UnknownSeries(_) => ApiError::Invalid(value.to_string()),
            PersistenceError::NotFound => ApiError::NotFound(value.to_string()),
            PersistenceError::Duplicate { .. } => ApiError::Conflict(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SeriesError> for ApiError {
    fn from(value: SeriesError) -> Self {
        match value {
            SeriesError::NotFound(_) => ApiError::NotFound(value.to_string()),
            SeriesError::Invalid(_) => ApiError::Invalid(value.to_string()),
            SeriesError::Store(err) => ApiError::from(err),
            SeriesError::Persistence { .. } => ApiError::Internal(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    from: NaiveDate,
    to: NaiveDate,
}

impl RangeQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if self.from > self.to {
            return Err(ApiError::invalid(format!(
                "range start {} is after range end {}",
                self.from, self.to
            )));
        }
        if (self.to - self.from).num_days() > MAX_RANGE_DAYS {
            return Err(ApiError::invalid(format!(
                "range may span at most {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SlotQuery {
    date: NaiveDate,
    #[serde(default)]
    exclude: Option<EventId>,
}

#[derive(Debug, Deserialize)]
struct CheckPayload {
    date: NaiveDate,
    time: String,
    #[serde(default)]
    exclude: Option<EventId>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    conflict: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedEvent {
    event: CalendarEvent,
    conflict: Option<String>,
}

#[derive(Debug, Serialize)]
struct Cursor {
    date: NaiveDate,
    minute: u32,
}

#[derive(Debug, Serialize)]
struct LayoutResponse {
    days: Vec<DayLayout>,
    cursor: Option<Cursor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config).put(update_config))
        .route("/events", get(list_events).post(create_event))
        .route("/layout", get(get_layout))
        .route("/slots", get(get_slots))
        .route("/slots/check", post(check_slot))
        .route("/series", get(list_series).post(create_series))
        .route("/series/:id", axum::routing::delete(deactivate_series))
        .route("/series/:id/extend", post(extend_series))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<SchedulingConfig> {
    Json(state.config())
}

async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<SchedulingConfig>,
) -> Result<Json<SchedulingConfig>, ApiError> {
    config
        .validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    *state.config.write() = config.clone();
    Ok(Json(config))
}

async fn list_events(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    range.validate()?;
    let events = state.store.events_in_range(range.from, range.to)?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<AppState>,
    Json(event): Json<NewCalendarEvent>,
) -> Result<(StatusCode, Json<CreatedEvent>), ApiError> {
    let config = state.config();
    let conflict = match (&event.event_kind, event.event_time.as_deref()) {
        (EventKind::Operation, Some(time)) => {
            let same_day = state.store.events_in_range(event.event_date, event.event_date)?;
            SlotFinder::new(&config, state.clock.as_ref())
                .check(time, event.event_date, &same_day, None)
                .map(|t| t.to_string())
        }
        _ => None,
    };
    let stored = state.store.insert_event(event)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedEvent {
            event: stored,
            conflict,
        }),
    ))
}

async fn get_layout(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<LayoutResponse>, ApiError> {
    range.validate()?;
    let config = state.config();
    SeriesEngine::new(state.store.as_ref(), state.clock.as_ref(), &config).ensure_all_extended()?;

    let events = state.store.events_in_range(range.from, range.to)?;
    let days: Vec<DayLayout> = layout::layout_range(&events, range.from, range.to, &config)
        .into_values()
        .collect();
    let today = state.clock.today();
    let cursor = (range.from..=range.to).contains(&today).then(|| Cursor {
        date: today,
        minute: layout::time_cursor(state.clock.as_ref(), today).unwrap_or(0),
    });
    Ok(Json(LayoutResponse { days, cursor }))
}

async fn get_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotAvailability>, ApiError> {
    let config = state.config();
    let events = state.store.events_in_range(query.date, query.date)?;
    let availability = SlotFinder::new(&config, state.clock.as_ref()).suggest_excluding(
        query.date,
        &events,
        query.exclude,
    );
    Ok(Json(availability))
}

async fn check_slot(
    State(state): State<AppState>,
    Json(payload): Json<CheckPayload>,
) -> Result<Json<CheckResponse>, ApiError> {
    let config = state.config();
    let events = state.store.events_in_range(payload.date, payload.date)?;
    let conflict = SlotFinder::new(&config, state.clock.as_ref())
        .check(&payload.time, payload.date, &events, payload.exclude)
        .map(|t| t.to_string());
    Ok(Json(CheckResponse { conflict }))
}

async fn list_series(State(state): State<AppState>) -> Result<Json<Vec<EventSeries>>, ApiError> {
    Ok(Json(state.store.list_series()?))
}

async fn create_series(
    State(state): State<AppState>,
    Json(series): Json<NewEventSeries>,
) -> Result<(StatusCode, Json<CreatedSeries>), ApiError> {
    let config = state.config();
    let created = SeriesEngine::new(state.store.as_ref(), state.clock.as_ref(), &config)
        .create_series(series)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn extend_series(
    State(state): State<AppState>,
    Path(series_id): Path<SeriesId>,
) -> Result<impl IntoResponse, ApiError> {
    let config = state.config();
    let created = SeriesEngine::new(state.store.as_ref(), state.clock.as_ref(), &config)
        .ensure_extended(series_id)?;
    Ok(Json(json!({ "created": created })))
}

async fn deactivate_series(
    State(state): State<AppState>,
    Path(series_id): Path<SeriesId>,
) -> Result<StatusCode, ApiError> {
    let config = state.config();
    SeriesEngine::new(state.store.as_ref(), state.clock.as_ref(), &config)
        .deactivate_series(series_id)
        .map_err(|err| match err {
            SeriesError::NotFound(id) => ApiError::not_found(format!("series {id} not found")),
            other => ApiError::from(other),
        })?;
    Ok(StatusCode::NO_CONTENT)
}
