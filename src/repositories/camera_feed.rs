//! # Camera Feed Repository
//!
//! This module contains the repository implementation for CameraFeed entities.

use crate::error::RepositoryError;
use crate::models::CameraStatus;
use crate::models::camera_feed::{
    self, ActiveModel as CameraFeedActiveModel, Entity as CameraFeed,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Validated fields for creating or updating a camera.
///
/// On update, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    pub name: String,
    pub location: String,
    pub ip: Option<String>,
    pub latency: Option<String>,
    pub status: Option<CameraStatus>,
    pub thumbnail: Option<String>,
    pub stream_url: Option<String>,
}

/// Repository for CameraFeed database operations
pub struct CameraFeedRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CameraFeedRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Cameras newest first, optionally restricted to one status
    pub async fn list(
        &self,
        status: Option<CameraStatus>,
    ) -> Result<Vec<camera_feed::Model>, RepositoryError> {
        let mut query = CameraFeed::find();
        if let Some(status) = status {
            query = query.filter(camera_feed::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(camera_feed::Column::CreatedAt)
            .order_by_desc(camera_feed::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<camera_feed::Model>, RepositoryError> {
        CameraFeed::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, input: CameraInput) -> Result<camera_feed::Model, RepositoryError> {
        let now = Utc::now();
        let camera = CameraFeedActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            location: Set(input.location),
            ip: Set(input.ip),
            latency: Set(input.latency),
            status: Set(input
                .status
                .unwrap_or(CameraStatus::Offline)
                .as_str()
                .to_string()),
            thumbnail: Set(input.thumbnail),
            uptime: Set(None),
            last_online: Set(None),
            stream_url: Set(input.stream_url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        camera
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: CameraInput,
    ) -> Result<camera_feed::Model, RepositoryError> {
        let existing = self.get(id).await?.ok_or_else(not_found)?;

        let mut active = existing.into_active_model();
        active.name = Set(input.name);
        active.location = Set(input.location);
        if input.ip.is_some() {
            active.ip = Set(input.ip);
        }
        if input.latency.is_some() {
            active.latency = Set(input.latency);
        }
        if let Some(status) = input.status {
            active.status = Set(status.as_str().to_string());
        }
        if input.thumbnail.is_some() {
            active.thumbnail = Set(input.thumbnail);
        }
        if input.stream_url.is_some() {
            active.stream_url = Set(input.stream_url);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = CameraFeed::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}

fn not_found() -> RepositoryError {
    RepositoryError::not_found("Camera not found")
}
