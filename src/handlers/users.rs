//! # Users API Handlers
//!
//! Profiles of dashboard users. Administrators manage everyone; other users
//! may read and rename only their own profile.

use crate::auth::Caller;
use crate::error::{ApiError, ErrorBody, bad_request, forbidden, not_found};
use crate::handlers::types::{ApiResponse, MessageResponse};
use crate::models::{Role, UserStatus, user_profile};
use crate::repositories::{ProfileUpdate, UserProfileRepository};
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

const PERMISSIONS_MUST_BE_ARRAY: &str = "Permissions must be an array";

/// User profile as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub status: String,
    pub permissions: Vec<String>,
    pub last_login: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<user_profile::Model> for UserDto {
    fn from(model: user_profile::Model) -> Self {
        let permissions = model.permission_list();
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            status: model.status,
            permissions,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Request body for updating a profile
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    /// Display name (max 100 characters)
    pub name: Option<String>,
    /// `admin`, `operator` or `viewer`; ignored unless the caller is an admin
    pub role: Option<String>,
    /// `active` or `inactive`; ignored unless the caller is an admin
    pub status: Option<String>,
    /// Permission strings; ignored unless the caller is an admin
    #[schema(value_type = Option<Vec<String>>)]
    pub permissions: Option<Value>,
}

impl UserUpdateRequest {
    fn validate(self) -> Result<ProfileUpdate, ApiError> {
        let mut errors = FieldErrors::new();
        errors.max_len("name", self.name.as_deref(), 100);
        let role = errors.one_of::<Role>("role", self.role.as_deref());
        let status = errors.one_of::<UserStatus>("status", self.status.as_deref());
        let permissions = match self.permissions {
            None | Some(Value::Null) => None,
            Some(value) => match permission_strings(&value) {
                Some(list) => Some(list),
                None => {
                    errors.push("permissions", "\"permissions\" must be an array of strings");
                    None
                }
            },
        };
        errors.finish()?;

        Ok(ProfileUpdate {
            name: self.name,
            role,
            status,
            permissions,
        })
    }
}

/// Request body for replacing a user's permissions
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionsRequest {
    #[schema(value_type = Vec<String>)]
    pub permissions: Option<Value>,
}

fn permission_strings(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Whether the caller is an administrator, looked up fresh from their profile
async fn caller_is_admin(state: &AppState, caller: &Caller) -> Result<bool, ApiError> {
    let role = UserProfileRepository::new(&state.db)
        .role_of(caller.user_id)
        .await?;
    Ok(role == Some(Role::Admin))
}

/// List every profile (admin)
#[utoipa::path(
    get,
    path = "/api/users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profiles", body = ApiResponse<Vec<UserDto>>),
        (status = 403, description = "Insufficient permissions", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<UserDto>>, ApiError> {
    let users = UserProfileRepository::new(&state.db).list().await?;
    Ok(ApiResponse::data(users.into_iter().map(UserDto::from).collect()))
}

/// The caller's own profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "User profile not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let profile = UserProfileRepository::new(&state.db)
        .get(caller.user_id)
        .await?
        .ok_or_else(|| not_found("User profile not found"))?;

    Ok(ApiResponse::data(profile.into()))
}

/// Fetch a profile (admin or self)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserDto>),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let id = parse_path_id(&id)?;
    if id != caller.user_id && !caller_is_admin(&state, &caller).await? {
        return Err(forbidden(None));
    }

    let profile = UserProfileRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("User not found"))?;

    Ok(ApiResponse::data(profile.into()))
}

/// Update a profile (admin or self).
///
/// Non-admins updating themselves can only change their name; `role`,
/// `status` and `permissions` in the body are dropped.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User id (UUID)")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let Json(request) = payload?;
    let update = request.validate()?;

    let is_admin = caller_is_admin(&state, &caller).await?;
    let update = if is_admin {
        update
    } else if id == caller.user_id {
        update.restricted_to_self_service()
    } else {
        return Err(forbidden(None));
    };

    let profile = UserProfileRepository::new(&state.db)
        .update(id, update)
        .await?;

    Ok(ApiResponse::with_message(
        profile.into(),
        "User profile updated successfully",
    ))
}

/// Replace a user's permission list (admin)
#[utoipa::path(
    patch,
    path = "/api/users/{id}/permissions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User id (UUID)")),
    request_body = PermissionsRequest,
    responses(
        (status = 200, description = "Permissions updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Permissions must be an array", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PermissionsRequest>, JsonRejection>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let id = parse_path_id(&id)?;
    let Json(request) = payload?;
    let permissions = request
        .permissions
        .as_ref()
        .and_then(permission_strings)
        .ok_or_else(|| bad_request(PERMISSIONS_MUST_BE_ARRAY))?;

    let profile = UserProfileRepository::new(&state.db)
        .set_permissions(id, permissions)
        .await?;
    tracing::info!(user_id = %id, "User permissions replaced");

    Ok(ApiResponse::with_message(
        profile.into(),
        "User permissions updated successfully",
    ))
}

/// Delete a user's profile (admin)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete your own account", body = ErrorBody),
        (status = 403, description = "Insufficient permissions", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    let id = parse_path_id(&id)?;
    if id == caller.user_id {
        return Err(bad_request("Cannot delete your own account"));
    }

    UserProfileRepository::new(&state.db).delete(id).await?;
    tracing::info!(user_id = %id, deleted_by = %caller.user_id, "User deleted");

    Ok(MessageResponse::new("User deleted successfully"))
}
