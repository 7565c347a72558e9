//! # Notifications API Handlers
//!
//! A user's notification inbox. Every handler is scoped to the caller.

use crate::auth::Caller;
use crate::error::{ApiError, ErrorBody};
use crate::handlers::types::{ApiResponse, MessageResponse};
use crate::models::notification;
use crate::repositories::NotificationRecord;
use crate::repositories::NotificationRepository;
use crate::server::AppState;
use crate::validation::{FieldErrors, MAX_LIMIT, parse_path_id};
use axum::extract::{Path, Query, State};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_NOTIFICATION_LIMIT: u64 = 50;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NotificationQuery {
    /// `true` or `false`; omitted returns both
    pub is_read: Option<String>,
    /// Maximum rows, 1-100 (default 50)
    pub limit: Option<String>,
}

/// Event fields embedded in a notification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationEventDto {
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub risk_level: String,
}

/// Notification as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_read: bool,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    /// Related event, when it still exists
    pub event_logs: Option<NotificationEventDto>,
}

impl NotificationDto {
    fn without_event(model: notification::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            message: model.message,
            kind: model.kind,
            is_read: model.is_read,
            event_id: model.event_id,
            created_at: model.created_at,
            event_logs: None,
        }
    }
}

impl From<NotificationRecord> for NotificationDto {
    fn from(record: NotificationRecord) -> Self {
        let mut dto = Self::without_event(record.notification);
        dto.event_logs = record.event.map(|event| NotificationEventDto {
            location: event.location,
            kind: event.kind,
            risk_level: event.risk_level,
        });
        dto
    }
}

fn parse_is_read(errors: &mut FieldErrors, raw: Option<&str>) -> Option<bool> {
    match raw.filter(|v| !v.is_empty())? {
        "true" => Some(true),
        "false" => Some(false),
        _ => {
            errors.push("is_read", "\"is_read\" must be a boolean");
            None
        }
    }
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = ApiResponse<Vec<NotificationDto>>),
        (status = 400, description = "Invalid filter", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<NotificationQuery>,
) -> Result<ApiResponse<Vec<NotificationDto>>, ApiError> {
    let mut errors = FieldErrors::new();
    let is_read = parse_is_read(&mut errors, query.is_read.as_deref());
    let limit = errors.bounded_u64(
        "limit",
        query.limit.as_deref(),
        DEFAULT_NOTIFICATION_LIMIT,
        Some(MAX_LIMIT),
    );
    errors.finish()?;

    let records = NotificationRepository::new(&state.db)
        .list_for_user(caller.user_id, is_read, limit)
        .await?;

    Ok(ApiResponse::data(
        records.into_iter().map(NotificationDto::from).collect(),
    ))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Notification id (UUID)")),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationDto>),
        (status = 404, description = "Notification not found", body = ErrorBody)
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<NotificationDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let notification = NotificationRepository::new(&state.db)
        .mark_read(caller.user_id, id)
        .await?;

    Ok(ApiResponse::with_message(
        NotificationDto::without_event(notification),
        "Notification marked as read",
    ))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All notifications marked as read", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<MessageResponse, ApiError> {
    let updated = NotificationRepository::new(&state.db)
        .mark_all_read(caller.user_id)
        .await?;
    tracing::debug!(user_id = %caller.user_id, updated, "Marked notifications read");

    Ok(MessageResponse::new("All notifications marked as read"))
}

/// Delete one of the caller's notifications
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Notification id (UUID)")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 404, description = "Notification not found", body = ErrorBody)
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    let id = parse_path_id(&id)?;
    NotificationRepository::new(&state.db)
        .delete(caller.user_id, id)
        .await?;

    Ok(MessageResponse::new("Notification deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_read_accepts_only_booleans() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_is_read(&mut errors, Some("true")), Some(true));
        assert_eq!(parse_is_read(&mut errors, Some("false")), Some(false));
        assert_eq!(parse_is_read(&mut errors, None), None);
        assert_eq!(parse_is_read(&mut errors, Some("")), None);
        assert!(errors.is_empty());

        assert_eq!(parse_is_read(&mut errors, Some("yes")), None);
        assert_eq!(errors.errors()[0].field, "is_read");
    }
}
