//! # Report Repository

use crate::error::RepositoryError;
use crate::models::report::{self, ActiveModel as ReportActiveModel, Entity as Report};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde_json::Value;
use uuid::Uuid;

/// Validated fields for a new report record
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub title: String,
    pub kind: Option<String>,
    pub date_range_start: Option<DateTimeWithTimeZone>,
    pub date_range_end: Option<DateTimeWithTimeZone>,
    pub file_url: Option<String>,
    pub metadata: Option<Value>,
}

pub struct ReportRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ReportRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<report::Model>, RepositoryError> {
        Report::find()
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<report::Model>, RepositoryError> {
        Report::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(
        &self,
        input: ReportInput,
        generated_by: Uuid,
    ) -> Result<report::Model, RepositoryError> {
        let active = ReportActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            kind: Set(input.kind),
            date_range_start: Set(input.date_range_start),
            date_range_end: Set(input.date_range_end),
            generated_by: Set(Some(generated_by)),
            file_url: Set(input.file_url),
            metadata: Set(input.metadata),
            created_at: Set(Utc::now().into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = Report::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Report not found"));
        }
        Ok(())
    }
}
