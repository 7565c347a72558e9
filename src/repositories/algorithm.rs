//! # Algorithm Repository
//!
//! CRUD operations for the algorithm library plus the online/offline toggle.

use crate::error::RepositoryError;
use crate::models::AlgorithmStatus;
use crate::models::algorithm::{self, ActiveModel as AlgorithmActiveModel, Entity as Algorithm};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use uuid::Uuid;

/// Validated fields for creating or updating an algorithm.
///
/// On update, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmInput {
    pub name: String,
    pub description: Option<String>,
    pub accuracy: Option<f64>,
    pub status: Option<AlgorithmStatus>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub kind: Option<String>,
}

pub struct AlgorithmRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AlgorithmRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All algorithms, newest first
    pub async fn list(&self) -> Result<Vec<algorithm::Model>, RepositoryError> {
        Algorithm::find()
            .order_by_desc(algorithm::Column::CreatedAt)
            .order_by_desc(algorithm::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<algorithm::Model>, RepositoryError> {
        Algorithm::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, input: AlgorithmInput) -> Result<algorithm::Model, RepositoryError> {
        let now = Utc::now();
        let algorithm = AlgorithmActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description.unwrap_or_default()),
            accuracy: Set(input.accuracy.unwrap_or(0.0)),
            status: Set(input
                .status
                .unwrap_or(AlgorithmStatus::Offline)
                .as_str()
                .to_string()),
            icon: Set(input.icon),
            color: Set(input.color),
            kind: Set(input.kind),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        algorithm
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: AlgorithmInput,
    ) -> Result<algorithm::Model, RepositoryError> {
        let existing = self.get(id).await?.ok_or_else(not_found)?;

        let mut active = existing.into_active_model();
        active.name = Set(input.name);
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(accuracy) = input.accuracy {
            active.accuracy = Set(accuracy);
        }
        if let Some(status) = input.status {
            active.status = Set(status.as_str().to_string());
        }
        if input.icon.is_some() {
            active.icon = Set(input.icon);
        }
        if input.color.is_some() {
            active.color = Set(input.color);
        }
        if input.kind.is_some() {
            active.kind = Set(input.kind);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = Algorithm::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    /// Flips online and offline, returning the updated row.
    ///
    /// Any stored status other than `online` toggles to `online`.
    pub async fn toggle(&self, id: Uuid) -> Result<algorithm::Model, RepositoryError> {
        let existing = self.get(id).await?.ok_or_else(not_found)?;

        let current = existing
            .status
            .parse::<AlgorithmStatus>()
            .unwrap_or(AlgorithmStatus::Offline);

        let mut active = existing.into_active_model();
        active.status = Set(current.toggled().as_str().to_string());
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn not_found() -> RepositoryError {
    RepositoryError::not_found("Algorithm not found")
}
