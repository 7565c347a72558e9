//! # Settings API Handlers
//!
//! System-wide key/value settings. Reads are open to every authenticated
//! user; writes are upserts restricted to administrators.

use std::collections::BTreeMap;

use crate::auth::Caller;
use crate::error::{ApiError, ErrorBody, bad_request, field_error};
use crate::handlers::types::ApiResponse;
use crate::models::system_setting;
use crate::repositories::{SettingWrite, SystemSettingRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SettingsQuery {
    /// Only settings in this category
    pub category: Option<String>,
}

/// One entry of the settings map, keyed by setting key
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingEntry {
    #[schema(value_type = Object)]
    pub value: Value,
    pub category: Option<String>,
    pub description: Option<String>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Settings keyed by setting key, in key order
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SettingsMap(pub BTreeMap<String, SettingEntry>);

impl FromIterator<system_setting::Model> for SettingsMap {
    fn from_iter<I: IntoIterator<Item = system_setting::Model>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|setting| {
                    (
                        setting.key,
                        SettingEntry {
                            value: setting.value,
                            category: setting.category,
                            description: setting.description,
                            updated_at: setting.updated_at,
                        },
                    )
                })
                .collect(),
        )
    }
}

/// Stored setting row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingDto {
    pub id: Uuid,
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
    pub category: Option<String>,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<system_setting::Model> for SettingDto {
    fn from(model: system_setting::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            value: model.value,
            category: model.category,
            description: model.description,
            updated_by: model.updated_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Request body for writing a single setting
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingRequest {
    /// Any JSON value except `null`
    #[schema(value_type = Object)]
    pub value: Option<Value>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Read settings as a key-ordered map
#[utoipa::path(
    get,
    path = "/api/settings",
    security(("bearer_auth" = [])),
    params(SettingsQuery),
    responses(
        (status = 200, description = "Settings map", body = ApiResponse<SettingsMap>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "settings"
)]
pub async fn list_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> Result<ApiResponse<SettingsMap>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let settings = SystemSettingRepository::new(&state.db)
        .list(category)
        .await?;

    Ok(ApiResponse::data(settings.into_iter().collect()))
}

/// Create or replace one setting (admin)
#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Setting key")),
    request_body = SettingRequest,
    responses(
        (status = 200, description = "Setting saved", body = ApiResponse<SettingDto>),
        (status = 400, description = "Value is required", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "settings"
)]
pub async fn update_setting(
    State(state): State<AppState>,
    caller: Caller,
    Path(key): Path<String>,
    payload: Result<Json<SettingRequest>, JsonRejection>,
) -> Result<ApiResponse<SettingDto>, ApiError> {
    let Json(request) = payload?;
    let value = request
        .value
        .filter(|v| !v.is_null())
        .ok_or_else(|| bad_request("Value is required"))?;

    let setting = SystemSettingRepository::new(&state.db)
        .upsert(
            SettingWrite {
                key,
                value,
                category: request.category,
                description: request.description,
            },
            caller.user_id,
        )
        .await?;
    tracing::info!(key = %setting.key, updated_by = %caller.user_id, "Setting updated");

    Ok(ApiResponse::with_message(
        setting.into(),
        "Setting updated successfully",
    ))
}

/// Upsert many settings in one transaction (admin).
///
/// The body maps each key to `{value, category?, description?}`.
#[utoipa::path(
    put,
    path = "/api/settings",
    security(("bearer_auth" = [])),
    request_body(content = Object, description = "Map of key to {value, category?, description?}"),
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<Vec<SettingDto>>),
        (status = 400, description = "Invalid settings object", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse<Vec<SettingDto>>, ApiError> {
    let Json(body) = payload?;
    let writes = bulk_writes(body)?;

    let count = writes.len();
    let saved = SystemSettingRepository::new(&state.db)
        .upsert_many(writes, caller.user_id)
        .await?;
    tracing::info!(count, updated_by = %caller.user_id, "Settings updated");

    Ok(ApiResponse::with_message(
        saved.into_iter().map(SettingDto::from).collect(),
        "Settings updated successfully",
    ))
}

fn bulk_writes(body: Value) -> Result<Vec<SettingWrite>, ApiError> {
    let Value::Object(entries) = body else {
        return Err(bad_request("Invalid settings object"));
    };

    entries
        .into_iter()
        .map(|(key, entry)| {
            let Value::Object(mut fields) = entry else {
                return Err(field_error(&key, "Invalid settings object"));
            };
            let value = fields
                .remove("value")
                .filter(|v| !v.is_null())
                .ok_or_else(|| field_error(&key, "Value is required"))?;
            let text = |v: Option<Value>| match v {
                Some(Value::String(s)) => Some(s),
                _ => None,
            };
            Ok(SettingWrite {
                category: text(fields.remove("category")),
                description: text(fields.remove("description")),
                key,
                value,
            })
        })
        .collect()
}
