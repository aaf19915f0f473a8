//! API Routes
//!
//! HTTP endpoint definitions. Handlers only parse input, call the store
//! and serialize what it returns.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{BatchItem, BatchOutcome, CalendarEvent, CalendarStore, EventChanges, EventView, NewEvent};
use crate::error::{AppError, AppResult};

// =========================================================================
// Request/Response types
// =========================================================================

/// Feed window, as sent by calendar front ends
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventIdQuery {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    pub person: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub id: i64,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<CalendarStore> {
    Router::new()
        .route("/health", get(health_check))
        .route("/data", get(event_feed))
        .route(
            "/calendar_event",
            get(get_event)
                .post(create_event)
                .put(update_event)
                .delete(delete_event),
        )
        .route("/calendar_events/batch", post(batch_upsert))
}

/// Accepts `2016-12-18`, `2016-12-18T09:30`, `2016-12-18T09:30:00[.fff]`
/// and RFC 3339 with an offset (wall-clock time is kept, offset dropped).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.naive_local());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::InvalidRequest(format!("Invalid timestamp '{}'", raw)))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// GET /data
// =========================================================================

/// Events starting inside `[start, end]`
async fn event_feed(
    State(store): State<CalendarStore>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<EventView>>> {
    let start = query.start.ok_or(AppError::MissingParameter("start"))?;
    let end = query.end.ok_or(AppError::MissingParameter("end"))?;

    let events = store
        .list_range(parse_timestamp(&start)?, parse_timestamp(&end)?)
        .await?;

    Ok(Json(events))
}

// =========================================================================
// /calendar_event
// =========================================================================

async fn get_event(
    State(store): State<CalendarStore>,
    Query(query): Query<EventIdQuery>,
) -> AppResult<Json<CalendarEvent>> {
    let id = query.id.ok_or(AppError::MissingParameter("id"))?;
    Ok(Json(store.read(id).await?))
}

async fn create_event(
    State(store): State<CalendarStore>,
    Json(request): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<CreateEventResponse>)> {
    let event = NewEvent {
        start_time: request.start_time,
        end_time: request.end_time,
        person: request.person,
    };

    let id = store.insert(&event).await?;

    Ok((StatusCode::CREATED, Json(CreateEventResponse { id })))
}

async fn update_event(
    State(store): State<CalendarStore>,
    Json(request): Json<UpdateEventRequest>,
) -> AppResult<Json<CalendarEvent>> {
    let changes = EventChanges {
        person: request.person,
        start_time: request.start_time,
        end_time: request.end_time,
    };

    Ok(Json(store.update(request.id, &changes).await?))
}

async fn delete_event(
    State(store): State<CalendarStore>,
    Query(query): Query<EventIdQuery>,
) -> AppResult<StatusCode> {
    let id = query.id.ok_or(AppError::MissingParameter("id"))?;
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// POST /calendar_events/batch
// =========================================================================

async fn batch_upsert(
    State(store): State<CalendarStore>,
    Json(items): Json<Vec<BatchItem>>,
) -> AppResult<Json<BatchOutcome>> {
    Ok(Json(store.insert_or_edit_batch(items).await?))
}
