//! Event log entity model
//!
//! This module contains the SeaORM entity model for the event_logs table,
//! which records safety events raised by detection algorithms on camera feeds.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Safety event observed on the highway
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_logs")]
pub struct Model {
    /// Unique identifier for the event (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// When the event happened; listings sort on this column
    pub time: DateTimeWithTimeZone,

    /// Where the event happened
    pub location: String,

    /// Event category (e.g. "Congestion", "Wrong-way driving")
    #[sea_orm(column_name = "type")]
    pub kind: String,

    /// `high`, `medium` or `low`
    pub risk_level: String,

    /// `handled`, `pending` or `observing`
    pub status: String,

    /// Camera that observed the event
    pub camera_id: Option<Uuid>,

    /// Algorithm that raised the event
    pub algorithm_id: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub snapshot_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::camera_feed::Entity",
        from = "Column::CameraId",
        to = "super::camera_feed::Column::Id"
    )]
    CameraFeed,
    #[sea_orm(
        belongs_to = "super::algorithm::Entity",
        from = "Column::AlgorithmId",
        to = "super::algorithm::Column::Id"
    )]
    Algorithm,
}

impl Related<super::camera_feed::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CameraFeed.def()
    }
}

impl Related<super::algorithm::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Algorithm.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
