//! # System Setting Repository
//!
//! Key/value settings with upsert semantics. Bulk writes run in a single
//! transaction so a failing entry leaves every setting unchanged.

use crate::error::RepositoryError;
use crate::models::system_setting::{
    self, ActiveModel as SystemSettingActiveModel, Entity as SystemSetting,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

/// One setting write; `None` keeps the stored category or description
#[derive(Debug, Clone, PartialEq)]
pub struct SettingWrite {
    pub key: String,
    pub value: Value,
    pub category: Option<String>,
    pub description: Option<String>,
}

pub struct SystemSettingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SystemSettingRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Settings ordered by key, optionally restricted to one category
    pub async fn list(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<system_setting::Model>, RepositoryError> {
        let mut query = SystemSetting::find();
        if let Some(category) = category {
            query = query.filter(system_setting::Column::Category.eq(category));
        }

        query
            .order_by_asc(system_setting::Column::Key)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn upsert(
        &self,
        write: SettingWrite,
        updated_by: Uuid,
    ) -> Result<system_setting::Model, RepositoryError> {
        upsert_one(self.db, write, updated_by).await
    }

    /// Upserts every entry atomically, returning rows in input order
    pub async fn upsert_many(
        &self,
        writes: Vec<SettingWrite>,
        updated_by: Uuid,
    ) -> Result<Vec<system_setting::Model>, RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let mut saved = Vec::with_capacity(writes.len());
        for write in writes {
            saved.push(upsert_one(&txn, write, updated_by).await?);
        }

        txn.commit()
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(saved)
    }
}

async fn upsert_one<C: ConnectionTrait>(
    conn: &C,
    write: SettingWrite,
    updated_by: Uuid,
) -> Result<system_setting::Model, RepositoryError> {
    if write.key.trim().is_empty() {
        return Err(RepositoryError::validation_error("Setting key is required"));
    }
    if write.value.is_null() {
        return Err(RepositoryError::validation_error("Value is required"));
    }

    let now = Utc::now();
    let existing = SystemSetting::find()
        .filter(system_setting::Column::Key.eq(write.key.as_str()))
        .one(conn)
        .await
        .map_err(RepositoryError::database_error)?;

    match existing {
        Some(existing) => {
            let mut active = existing.into_active_model();
            active.value = Set(write.value);
            if write.category.is_some() {
                active.category = Set(write.category);
            }
            if write.description.is_some() {
                active.description = Set(write.description);
            }
            active.updated_by = Set(Some(updated_by));
            active.updated_at = Set(now.into());
            active
                .update(conn)
                .await
                .map_err(RepositoryError::database_error)
        }
        None => {
            let active = SystemSettingActiveModel {
                id: Set(Uuid::new_v4()),
                key: Set(write.key),
                value: Set(write.value),
                category: Set(write.category),
                description: Set(write.description),
                updated_by: Set(Some(updated_by)),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            active
                .insert(conn)
                .await
                .map_err(RepositoryError::database_error)
        }
    }
}
