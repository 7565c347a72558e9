//! # Cameras API Handlers
//!
//! This module contains handlers for managing highway camera feeds.

use crate::error::{ApiError, ErrorBody, not_found};
use crate::handlers::types::{ApiResponse, Created, MessageResponse};
use crate::models::CameraStatus;
use crate::models::camera_feed;
use crate::repositories::{CameraFeedRepository, CameraInput};
use crate::server::AppState;
use crate::validation::{FieldErrors, parse_path_id};
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query parameters for listing cameras
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CameraListQuery {
    /// Only cameras in this state (`online`, `offline`, `warning`)
    pub status: Option<String>,
}

/// Request body for creating or updating a camera
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct CameraRequest {
    #[schema(example = "K1203 northbound")]
    pub name: Option<String>,
    #[schema(example = "G4 Beijing-Hong Kong-Macau Expressway K1203+500")]
    pub location: Option<String>,
    #[schema(example = "10.20.3.17")]
    pub ip: Option<String>,
    #[schema(example = "45ms")]
    pub latency: Option<String>,
    pub status: Option<String>,
    pub thumbnail: Option<String>,
    /// Absolute stream URI
    #[schema(example = "rtsp://10.20.3.17/stream1")]
    pub stream_url: Option<String>,
}

impl CameraRequest {
    fn validate(self) -> Result<CameraInput, ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", self.name.as_deref());
        errors.max_len("name", self.name.as_deref(), 100);
        errors.required("location", self.location.as_deref());
        errors.max_len("location", self.location.as_deref(), 200);
        errors.max_len("ip", self.ip.as_deref(), 50);
        errors.max_len("latency", self.latency.as_deref(), 20);
        let status = errors.one_of::<CameraStatus>("status", self.status.as_deref());
        errors.uri("stream_url", self.stream_url.as_deref());
        errors.finish()?;

        Ok(CameraInput {
            name: self.name.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            ip: self.ip,
            latency: self.latency,
            status,
            thumbnail: self.thumbnail,
            stream_url: self.stream_url,
        })
    }
}

/// Camera as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CameraDto {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub ip: Option<String>,
    pub latency: Option<String>,
    pub status: String,
    pub thumbnail: Option<String>,
    pub uptime: Option<String>,
    pub last_online: Option<DateTime<FixedOffset>>,
    pub stream_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<camera_feed::Model> for CameraDto {
    fn from(model: camera_feed::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            location: model.location,
            ip: model.ip,
            latency: model.latency,
            status: model.status,
            thumbnail: model.thumbnail,
            uptime: model.uptime,
            last_online: model.last_online,
            stream_url: model.stream_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Liveness projection of a camera
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CameraStatusDto {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub latency: Option<String>,
    pub uptime: Option<String>,
    pub last_online: Option<DateTime<FixedOffset>>,
}

impl From<camera_feed::Model> for CameraStatusDto {
    fn from(model: camera_feed::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            status: model.status,
            latency: model.latency,
            uptime: model.uptime,
            last_online: model.last_online,
        }
    }
}

/// List cameras, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/cameras",
    security(("bearer_auth" = [])),
    params(CameraListQuery),
    responses(
        (status = 200, description = "Cameras", body = ApiResponse<Vec<CameraDto>>),
        (status = 400, description = "Unknown status filter", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn list_cameras(
    State(state): State<AppState>,
    Query(query): Query<CameraListQuery>,
) -> Result<ApiResponse<Vec<CameraDto>>, ApiError> {
    let mut errors = FieldErrors::new();
    let status = errors.one_of::<CameraStatus>("status", query.status.as_deref());
    errors.finish()?;

    let cameras = CameraFeedRepository::new(&state.db).list(status).await?;
    Ok(ApiResponse::data(
        cameras.into_iter().map(CameraDto::from).collect(),
    ))
}

/// Fetch one camera
#[utoipa::path(
    get,
    path = "/api/cameras/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Camera id (UUID)")),
    responses(
        (status = 200, description = "Camera", body = ApiResponse<CameraDto>),
        (status = 404, description = "Camera not found", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn get_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<CameraDto>, ApiError> {
    let camera = find_camera(&state, &id).await?;
    Ok(ApiResponse::data(camera.into()))
}

/// Current status, latency and uptime of a camera
#[utoipa::path(
    get,
    path = "/api/cameras/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Camera id (UUID)")),
    responses(
        (status = 200, description = "Camera status", body = ApiResponse<CameraStatusDto>),
        (status = 404, description = "Camera not found", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn get_camera_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<CameraStatusDto>, ApiError> {
    let camera = find_camera(&state, &id).await?;
    Ok(ApiResponse::data(camera.into()))
}

async fn find_camera(state: &AppState, raw_id: &str) -> Result<camera_feed::Model, ApiError> {
    let id = parse_path_id(raw_id)?;
    CameraFeedRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("Camera not found"))
}

/// Register a camera (admin, operator)
#[utoipa::path(
    post,
    path = "/api/cameras",
    security(("bearer_auth" = [])),
    request_body = CameraRequest,
    responses(
        (status = 201, description = "Camera created", body = ApiResponse<CameraDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn create_camera(
    State(state): State<AppState>,
    payload: Result<Json<CameraRequest>, JsonRejection>,
) -> Result<Created<CameraDto>, ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let camera = CameraFeedRepository::new(&state.db).create(input).await?;
    tracing::info!(camera_id = %camera.id, "Camera created");

    Ok(Created(ApiResponse::with_message(
        camera.into(),
        "Camera created successfully",
    )))
}

/// Update a camera (admin, operator)
#[utoipa::path(
    put,
    path = "/api/cameras/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Camera id (UUID)")),
    request_body = CameraRequest,
    responses(
        (status = 200, description = "Camera updated", body = ApiResponse<CameraDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Camera not found", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn update_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CameraRequest>, JsonRejection>,
) -> Result<ApiResponse<CameraDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let Json(request) = payload?;
    let input = request.validate()?;

    let camera = CameraFeedRepository::new(&state.db).update(id, input).await?;

    Ok(ApiResponse::with_message(
        camera.into(),
        "Camera updated successfully",
    ))
}

/// Remove a camera (admin)
#[utoipa::path(
    delete,
    path = "/api/cameras/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Camera id (UUID)")),
    responses(
        (status = 200, description = "Camera deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Camera not found", body = ErrorBody)
    ),
    tag = "cameras"
)]
pub async fn delete_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    let id = parse_path_id(&id)?;
    CameraFeedRepository::new(&state.db).delete(id).await?;
    tracing::info!(camera_id = %id, "Camera deleted");

    Ok(MessageResponse::new("Camera deleted successfully"))
}
