//! Notification entity model
//!
//! Notifications belong to a single user and may point at the event that
//! triggered them.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user profile
    pub user_id: Uuid,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    #[sea_orm(column_name = "type")]
    pub kind: Option<String>,

    pub is_read: bool,

    /// Event that triggered the notification
    pub event_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_profile::Entity",
        from = "Column::UserId",
        to = "super::user_profile::Column::Id"
    )]
    UserProfile,
    #[sea_orm(
        belongs_to = "super::event_log::Entity",
        from = "Column::EventId",
        to = "super::event_log::Column::Id"
    )]
    EventLog,
}

impl Related<super::event_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
