//! # Notification Repository
//!
//! Every operation here is scoped to the owning user; a notification that
//! belongs to someone else behaves exactly like one that does not exist.

use std::collections::{HashMap, HashSet};

use crate::error::RepositoryError;
use crate::models::event_log::{self, Entity as EventLog};
use crate::models::notification::{
    self, ActiveModel as NotificationActiveModel, Entity as Notification,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Event columns embedded in notification responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub location: String,
    pub kind: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub notification: notification::Model,
    pub event: Option<EventSummary>,
}

/// Fields for a new notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: Option<String>,
    pub event_id: Option<Uuid>,
}

pub struct NotificationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// The user's notifications, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        is_read: Option<bool>,
        limit: u64,
    ) -> Result<Vec<NotificationRecord>, RepositoryError> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));
        if let Some(is_read) = is_read {
            query = query.filter(notification::Column::IsRead.eq(is_read));
        }

        let notifications = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let event_ids: HashSet<Uuid> = notifications.iter().filter_map(|n| n.event_id).collect();
        let events: HashMap<Uuid, EventSummary> = if event_ids.is_empty() {
            HashMap::new()
        } else {
            EventLog::find()
                .filter(event_log::Column::Id.is_in(event_ids))
                .all(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .into_iter()
                .map(|event| {
                    (
                        event.id,
                        EventSummary {
                            location: event.location,
                            kind: event.kind,
                            risk_level: event.risk_level,
                        },
                    )
                })
                .collect()
        };

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationRecord {
                event: notification.event_id.and_then(|id| events.get(&id).cloned()),
                notification,
            })
            .collect())
    }

    pub async fn create(
        &self,
        new: NewNotification,
    ) -> Result<notification::Model, RepositoryError> {
        let active = NotificationActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            title: Set(new.title),
            message: Set(new.message),
            kind: Set(new.kind),
            is_read: Set(false),
            event_id: Set(new.event_id),
            created_at: Set(Utc::now().into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<notification::Model, RepositoryError> {
        let existing = self.find_owned(user_id, id).await?;

        let mut active = existing.into_active_model();
        active.is_read = Set(true);
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Marks every unread notification of the user as read, returning how many changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let result = Notification::delete_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<notification::Model, RepositoryError> {
        Notification::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(not_found)
    }
}

fn not_found() -> RepositoryError {
    RepositoryError::not_found("Notification not found")
}
