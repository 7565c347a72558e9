//! # Events API Handlers
//!
//! Safety events raised by detection algorithms. Listing, stats and export
//! share one filter parser so the CSV download always matches what the
//! paginated listing shows.

use crate::error::{ApiError, ErrorBody, not_found};
use crate::export::{CSV_CONTENT_TYPE, events_to_csv, export_filename};
use crate::handlers::types::{ApiResponse, Created, PaginatedResponse, Pagination};
use crate::models::{EventStatus, RiskLevel, event_log};
use crate::repositories::event_log::{AlgorithmRef, CameraRef};
use crate::repositories::{EventFilter, EventInput, EventLogRepository, EventRecord, EventStats};
use crate::server::AppState;
use crate::validation::{FieldErrors, page_params, parse_path_id};
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Filters accepted by the listing, stats and export endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventListQuery {
    /// `handled`, `pending` or `observing`
    pub status: Option<String>,
    /// `high`, `medium` or `low`
    pub risk_level: Option<String>,
    /// Inclusive lower bound; RFC 3339 or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound; RFC 3339 or `YYYY-MM-DD`
    pub end_date: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Page size, 1-100 (default 20)
    pub limit: Option<String>,
}

impl EventListQuery {
    fn filter(&self, errors: &mut FieldErrors) -> EventFilter {
        EventFilter {
            status: errors.one_of::<EventStatus>("status", non_empty(&self.status)),
            risk_level: errors.one_of::<RiskLevel>("risk_level", non_empty(&self.risk_level)),
            start: errors.timestamp("start_date", self.start_date.as_deref()),
            end: errors.timestamp("end_date", self.end_date.as_deref()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Request body for recording an event
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventRequest {
    /// When the event happened (RFC 3339); defaults to now
    pub time: Option<String>,
    #[schema(example = "G4 K1203+500 northbound")]
    pub location: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "Wrong-way vehicle")]
    pub kind: Option<String>,
    /// Defaults to `low`
    pub risk_level: Option<String>,
    /// Defaults to `pending`
    pub status: Option<String>,
    pub camera_id: Option<String>,
    pub algorithm_id: Option<String>,
    pub description: Option<String>,
    pub snapshot_url: Option<String>,
}

impl EventRequest {
    fn validate(self) -> Result<EventInput, ApiError> {
        let mut errors = FieldErrors::new();
        let time = errors.timestamp("time", self.time.as_deref());
        errors.required("location", self.location.as_deref());
        errors.max_len("location", self.location.as_deref(), 200);
        errors.required("type", self.kind.as_deref());
        errors.max_len("type", self.kind.as_deref(), 50);
        let risk_level = errors.one_of::<RiskLevel>("risk_level", self.risk_level.as_deref());
        let status = errors.one_of::<EventStatus>("status", self.status.as_deref());
        let camera_id = errors.uuid("camera_id", self.camera_id.as_deref());
        let algorithm_id = errors.uuid("algorithm_id", self.algorithm_id.as_deref());
        errors.uri("snapshot_url", self.snapshot_url.as_deref());
        errors.finish()?;

        Ok(EventInput {
            time,
            location: self.location.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            risk_level: risk_level.unwrap_or(RiskLevel::Low),
            status: status.unwrap_or(EventStatus::Pending),
            camera_id,
            algorithm_id,
            description: self.description,
            snapshot_url: self.snapshot_url,
        })
    }
}

/// Request body for updating an event's handling state
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventUpdateRequest {
    pub status: Option<String>,
    pub description: Option<String>,
}

/// Camera fields embedded in an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCameraDto {
    pub name: String,
    pub location: String,
}

/// Algorithm fields embedded in an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventAlgorithmDto {
    pub name: String,
}

/// Event as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    pub id: Uuid,
    pub time: DateTime<FixedOffset>,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub risk_level: String,
    pub status: String,
    pub camera_id: Option<Uuid>,
    pub algorithm_id: Option<Uuid>,
    pub description: Option<String>,
    pub snapshot_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// Referenced camera, when it still exists
    pub camera_feeds: Option<EventCameraDto>,
    /// Referenced algorithm, when it still exists
    pub algorithms: Option<EventAlgorithmDto>,
}

impl EventDto {
    fn from_parts(
        event: event_log::Model,
        camera: Option<CameraRef>,
        algorithm: Option<AlgorithmRef>,
    ) -> Self {
        Self {
            id: event.id,
            time: event.time,
            location: event.location,
            kind: event.kind,
            risk_level: event.risk_level,
            status: event.status,
            camera_id: event.camera_id,
            algorithm_id: event.algorithm_id,
            description: event.description,
            snapshot_url: event.snapshot_url,
            created_at: event.created_at,
            updated_at: event.updated_at,
            camera_feeds: camera.map(|c| EventCameraDto {
                name: c.name,
                location: c.location,
            }),
            algorithms: algorithm.map(|a| EventAlgorithmDto { name: a.name }),
        }
    }
}

impl From<EventRecord> for EventDto {
    fn from(record: EventRecord) -> Self {
        Self::from_parts(record.event, record.camera, record.algorithm)
    }
}

/// List events, newest first, with filters and pagination
#[utoipa::path(
    get,
    path = "/api/events",
    security(("bearer_auth" = [])),
    params(EventListQuery),
    responses(
        (status = 200, description = "One page of events", body = PaginatedResponse<EventDto>),
        (status = 400, description = "Invalid filter or pagination", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<PaginatedResponse<EventDto>, ApiError> {
    let mut errors = FieldErrors::new();
    let filter = query.filter(&mut errors);
    let (page, limit) = page_params(&mut errors, query.page.as_deref(), query.limit.as_deref());
    errors.finish()?;

    let (records, total) = EventLogRepository::new(&state.db)
        .list_page(&filter, page, limit)
        .await?;

    Ok(PaginatedResponse::new(
        records.into_iter().map(EventDto::from).collect(),
        Pagination::new(page, limit, total),
    ))
}

/// Counts by risk level and status within an optional date range
#[utoipa::path(
    get,
    path = "/api/events/stats",
    security(("bearer_auth" = [])),
    params(EventListQuery),
    responses(
        (status = 200, description = "Event statistics", body = ApiResponse<EventStats>),
        (status = 400, description = "Invalid date", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn event_stats(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<ApiResponse<EventStats>, ApiError> {
    let mut errors = FieldErrors::new();
    let filter = query.filter(&mut errors);
    errors.finish()?;

    let stats = EventLogRepository::new(&state.db).stats(&filter).await?;
    Ok(ApiResponse::data(stats))
}

/// Download every filtered event as CSV
#[utoipa::path(
    get,
    path = "/api/events/export",
    security(("bearer_auth" = [])),
    params(EventListQuery),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn export_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Response, ApiError> {
    let mut errors = FieldErrors::new();
    let filter = query.filter(&mut errors);
    errors.finish()?;

    let records = EventLogRepository::new(&state.db).list_all(&filter).await?;
    let csv = events_to_csv(&records);

    counter!("events_exported_rows_total").increment(records.len() as u64);
    tracing::info!(rows = records.len(), "Exported events");

    let disposition = format!("attachment; filename=\"{}\"", export_filename(Utc::now()));
    Ok((
        [(CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()), (CONTENT_DISPOSITION, disposition)],
        csv,
    )
        .into_response())
}

/// Fetch one event
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event id (UUID)")),
    responses(
        (status = 200, description = "Event", body = ApiResponse<EventDto>),
        (status = 404, description = "Event not found", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<EventDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let record = EventLogRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("Event not found"))?;

    Ok(ApiResponse::data(record.into()))
}

/// Record an event (admin, operator)
#[utoipa::path(
    post,
    path = "/api/events",
    security(("bearer_auth" = [])),
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = ApiResponse<EventDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Created<EventDto>, ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let repo = EventLogRepository::new(&state.db);
    let event = repo.create(input).await?;
    tracing::info!(event_id = %event.id, risk_level = %event.risk_level, "Event recorded");

    let record = repo.get(event.id).await?.ok_or_else(|| not_found("Event not found"))?;
    Ok(Created(ApiResponse::with_message(
        record.into(),
        "Event created successfully",
    )))
}

/// Change an event's status or description (admin, operator)
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event id (UUID)")),
    request_body = EventUpdateRequest,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse<EventDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Event not found", body = ErrorBody)
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EventUpdateRequest>, JsonRejection>,
) -> Result<ApiResponse<EventDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let status = errors.one_of::<EventStatus>("status", request.status.as_deref());
    errors.finish()?;

    let repo = EventLogRepository::new(&state.db);
    repo.update_status(id, status, request.description).await?;
    let record = repo.get(id).await?.ok_or_else(|| not_found("Event not found"))?;

    Ok(ApiResponse::with_message(
        record.into(),
        "Event updated successfully",
    ))
}
