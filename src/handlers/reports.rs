//! # Reports API Handlers

use crate::auth::Caller;
use crate::error::{ApiError, ErrorBody, not_found};
use crate::handlers::types::{ApiResponse, Created, MessageResponse};
use crate::models::report;
use crate::repositories::{ReportInput, ReportRepository};
use crate::server::AppState;
use crate::validation::{FieldErrors, parse_path_id};
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for registering a generated report
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[schema(example = "Weekly incident summary")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "weekly")]
    pub kind: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`
    pub date_range_start: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`
    pub date_range_end: Option<String>,
    pub file_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl ReportRequest {
    fn validate(self) -> Result<ReportInput, ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("title", self.title.as_deref());
        errors.max_len("title", self.title.as_deref(), 200);
        errors.max_len("type", self.kind.as_deref(), 50);
        let start = errors.timestamp("date_range_start", self.date_range_start.as_deref());
        let end = errors.timestamp("date_range_end", self.date_range_end.as_deref());
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            errors.push(
                "date_range_end",
                "\"date_range_end\" must be greater than or equal to \"date_range_start\"",
            );
        }
        errors.uri("file_url", self.file_url.as_deref());
        let metadata = match self.metadata {
            None | Some(Value::Null) => None,
            Some(value @ Value::Object(_)) => Some(value),
            Some(_) => {
                errors.push("metadata", "\"metadata\" must be of type object");
                None
            }
        };
        errors.finish()?;

        Ok(ReportInput {
            title: self.title.unwrap_or_default(),
            kind: self.kind,
            date_range_start: start,
            date_range_end: end,
            file_url: self.file_url,
            metadata,
        })
    }
}

/// Report record as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDto {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date_range_start: Option<DateTime<FixedOffset>>,
    pub date_range_end: Option<DateTime<FixedOffset>>,
    pub generated_by: Option<Uuid>,
    pub file_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<report::Model> for ReportDto {
    fn from(model: report::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            kind: model.kind,
            date_range_start: model.date_range_start,
            date_range_end: model.date_range_end,
            generated_by: model.generated_by,
            file_url: model.file_url,
            metadata: model.metadata,
            created_at: model.created_at,
        }
    }
}

/// List reports, newest first
#[utoipa::path(
    get,
    path = "/api/reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reports", body = ApiResponse<Vec<ReportDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ReportDto>>, ApiError> {
    let reports = ReportRepository::new(&state.db).list().await?;
    Ok(ApiResponse::data(reports.into_iter().map(ReportDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Report id (UUID)")),
    responses(
        (status = 200, description = "Report", body = ApiResponse<ReportDto>),
        (status = 404, description = "Report not found", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ReportDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let report = ReportRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("Report not found"))?;

    Ok(ApiResponse::data(report.into()))
}

/// Register a report (admin, operator); the caller is recorded as its author
#[utoipa::path(
    post,
    path = "/api/reports",
    security(("bearer_auth" = [])),
    request_body = ReportRequest,
    responses(
        (status = 201, description = "Report created", body = ApiResponse<ReportDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Created<ReportDto>, ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let report = ReportRepository::new(&state.db)
        .create(input, caller.user_id)
        .await?;
    tracing::info!(report_id = %report.id, generated_by = %caller.user_id, "Report created");

    Ok(Created(ApiResponse::with_message(
        report.into(),
        "Report created successfully",
    )))
}

/// Delete a report (admin)
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Report id (UUID)")),
    responses(
        (status = 200, description = "Report deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "Report not found", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    let id = parse_path_id(&id)?;
    ReportRepository::new(&state.db).delete(id).await?;

    Ok(MessageResponse::new("Report deleted successfully"))
}
