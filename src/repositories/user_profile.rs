//! # User Profile Repository
//!
//! Profiles mirror identity-provider accounts. Besides CRUD, this repository
//! answers the role lookup the authorization gate depends on.

use crate::error::RepositoryError;
use crate::models::user_profile::{
    self, ActiveModel as UserProfileActiveModel, Entity as UserProfile,
};
use crate::models::{Role, UserStatus};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, QuerySelect,
    Set,
};
use serde_json::Value;
use uuid::Uuid;

/// Fields for a new profile
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    /// Identity provider user id
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Partial profile update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub permissions: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Drops the fields only an administrator may change
    pub fn restricted_to_self_service(self) -> Self {
        Self {
            name: self.name,
            ..Self::default()
        }
    }
}

pub struct UserProfileRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserProfileRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// The caller's role, or `None` when no profile exists.
    ///
    /// A stored role outside the known set is treated as `viewer`.
    pub async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>, RepositoryError> {
        let role: Option<String> = UserProfile::find_by_id(user_id)
            .select_only()
            .column(user_profile::Column::Role)
            .into_tuple()
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(role.map(|raw| {
            raw.parse::<Role>().unwrap_or_else(|_| {
                tracing::warn!(%user_id, role = %raw, "Unknown role on user profile; treating as viewer");
                Role::Viewer
            })
        }))
    }

    /// All profiles, newest first
    pub async fn list(&self) -> Result<Vec<user_profile::Model>, RepositoryError> {
        UserProfile::find()
            .order_by_desc(user_profile::Column::CreatedAt)
            .order_by_desc(user_profile::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<user_profile::Model>, RepositoryError> {
        UserProfile::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(
        &self,
        profile: NewUserProfile,
    ) -> Result<user_profile::Model, RepositoryError> {
        let now = Utc::now();
        let active = UserProfileActiveModel {
            id: Set(profile.id),
            name: Set(profile.name),
            email: Set(profile.email),
            role: Set(profile.role.as_str().to_string()),
            status: Set(UserStatus::Active.as_str().to_string()),
            permissions: Set(Some(Value::Array(Vec::new()))),
            last_login: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<user_profile::Model, RepositoryError> {
        let existing = self.get(id).await?.ok_or_else(not_found)?;

        let mut active = existing.into_active_model();
        if update.name.is_some() {
            active.name = Set(update.name);
        }
        if let Some(role) = update.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(status) = update.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(permissions) = update.permissions {
            active.permissions = Set(Some(permissions_json(permissions)));
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn set_permissions(
        &self,
        id: Uuid,
        permissions: Vec<String>,
    ) -> Result<user_profile::Model, RepositoryError> {
        self.update(
            id,
            ProfileUpdate {
                permissions: Some(permissions),
                ..ProfileUpdate::default()
            },
        )
        .await
    }

    /// Removes the profile row only; the identity provider account is untouched
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = UserProfile::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}

fn permissions_json(permissions: Vec<String>) -> Value {
    Value::Array(permissions.into_iter().map(Value::String).collect())
}

fn not_found() -> RepositoryError {
    RepositoryError::not_found("User not found")
}
