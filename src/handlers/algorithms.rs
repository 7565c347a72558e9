//! # Algorithms API Handlers
//!
//! This module contains handlers for the algorithm library: listing, CRUD,
//! and switching an algorithm online or offline.

use crate::error::{ApiError, ErrorBody, not_found};
use crate::handlers::types::{ApiResponse, Created, MessageResponse};
use crate::models::algorithm;
use crate::models::AlgorithmStatus;
use crate::repositories::{AlgorithmInput, AlgorithmRepository};
use crate::server::AppState;
use crate::validation::{FieldErrors, parse_path_id};
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for creating or replacing an algorithm
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlgorithmRequest {
    /// Display name (required, max 100 characters)
    #[schema(example = "Wrong-way driving detection")]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Detection accuracy percentage, 0-100
    #[schema(example = 97.5)]
    pub accuracy: Option<f64>,
    /// `online` or `offline`
    #[schema(example = "online")]
    pub status: Option<String>,
    /// Icon identifier (max 50 characters)
    pub icon: Option<String>,
    /// Accent colour (max 20 characters)
    pub color: Option<String>,
    /// Detection category (max 50 characters)
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl AlgorithmRequest {
    fn validate(self) -> Result<AlgorithmInput, ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", self.name.as_deref());
        errors.max_len("name", self.name.as_deref(), 100);
        errors.range("accuracy", self.accuracy, 0.0, 100.0);
        let status = errors.one_of::<AlgorithmStatus>("status", self.status.as_deref());
        errors.max_len("icon", self.icon.as_deref(), 50);
        errors.max_len("color", self.color.as_deref(), 20);
        errors.max_len("type", self.kind.as_deref(), 50);
        errors.finish()?;

        Ok(AlgorithmInput {
            name: self.name.unwrap_or_default(),
            description: self.description,
            accuracy: self.accuracy,
            status,
            icon: self.icon,
            color: self.color,
            kind: self.kind,
        })
    }
}

/// Algorithm as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlgorithmDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub accuracy: f64,
    pub status: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<algorithm::Model> for AlgorithmDto {
    fn from(model: algorithm::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            accuracy: model.accuracy,
            status: model.status,
            icon: model.icon,
            color: model.color,
            kind: model.kind,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List all algorithms, newest first
#[utoipa::path(
    get,
    path = "/api/algorithms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Algorithms", body = ApiResponse<Vec<AlgorithmDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn list_algorithms(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<AlgorithmDto>>, ApiError> {
    let algorithms = AlgorithmRepository::new(&state.db).list().await?;
    Ok(ApiResponse::data(
        algorithms.into_iter().map(AlgorithmDto::from).collect(),
    ))
}

/// Fetch one algorithm
#[utoipa::path(
    get,
    path = "/api/algorithms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Algorithm id (UUID)")),
    responses(
        (status = 200, description = "Algorithm", body = ApiResponse<AlgorithmDto>),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "Algorithm not found", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn get_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AlgorithmDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let algorithm = AlgorithmRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("Algorithm not found"))?;

    Ok(ApiResponse::data(algorithm.into()))
}

/// Create an algorithm (admin)
#[utoipa::path(
    post,
    path = "/api/algorithms",
    security(("bearer_auth" = [])),
    request_body = AlgorithmRequest,
    responses(
        (status = 201, description = "Algorithm created", body = ApiResponse<AlgorithmDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn create_algorithm(
    State(state): State<AppState>,
    payload: Result<Json<AlgorithmRequest>, JsonRejection>,
) -> Result<Created<AlgorithmDto>, ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let algorithm = AlgorithmRepository::new(&state.db).create(input).await?;
    tracing::info!(algorithm_id = %algorithm.id, "Algorithm created");

    Ok(Created(ApiResponse::with_message(
        algorithm.into(),
        "Algorithm created successfully",
    )))
}

/// Update an algorithm (admin)
#[utoipa::path(
    put,
    path = "/api/algorithms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Algorithm id (UUID)")),
    request_body = AlgorithmRequest,
    responses(
        (status = 200, description = "Algorithm updated", body = ApiResponse<AlgorithmDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Algorithm not found", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn update_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AlgorithmRequest>, JsonRejection>,
) -> Result<ApiResponse<AlgorithmDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let Json(request) = payload?;
    let input = request.validate()?;

    let algorithm = AlgorithmRepository::new(&state.db).update(id, input).await?;

    Ok(ApiResponse::with_message(
        algorithm.into(),
        "Algorithm updated successfully",
    ))
}

/// Delete an algorithm (admin)
#[utoipa::path(
    delete,
    path = "/api/algorithms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Algorithm id (UUID)")),
    responses(
        (status = 200, description = "Algorithm deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Algorithm not found", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn delete_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    let id = parse_path_id(&id)?;
    AlgorithmRepository::new(&state.db).delete(id).await?;
    tracing::info!(algorithm_id = %id, "Algorithm deleted");

    Ok(MessageResponse::new("Algorithm deleted successfully"))
}

/// Switch an algorithm between online and offline (admin, operator)
#[utoipa::path(
    patch,
    path = "/api/algorithms/{id}/toggle",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Algorithm id (UUID)")),
    responses(
        (status = 200, description = "Algorithm toggled", body = ApiResponse<AlgorithmDto>),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Algorithm not found", body = ErrorBody)
    ),
    tag = "algorithms"
)]
pub async fn toggle_algorithm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<AlgorithmDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let algorithm = AlgorithmRepository::new(&state.db).toggle(id).await?;

    let verb = if algorithm.status == AlgorithmStatus::Online.as_str() {
        "enabled"
    } else {
        "disabled"
    };
    tracing::info!(algorithm_id = %id, status = %algorithm.status, "Algorithm toggled");

    Ok(ApiResponse::with_message(
        algorithm.into(),
        format!("Algorithm {verb} successfully"),
    ))
}
