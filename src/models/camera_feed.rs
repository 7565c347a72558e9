//! Camera feed entity model
//!
//! This module contains the SeaORM entity model for the camera_feeds table,
//! one row per highway camera.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Highway camera and its last known health
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "camera_feeds")]
pub struct Model {
    /// Unique identifier for the camera (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the camera
    pub name: String,

    /// Human readable mounting location (road section, kilometre marker)
    pub location: String,

    /// Network address of the camera
    pub ip: Option<String>,

    /// Last measured stream latency as displayed (e.g. "45ms")
    pub latency: Option<String>,

    /// `online`, `offline` or `warning`
    pub status: String,

    /// Thumbnail image URL or data URI
    #[sea_orm(column_type = "Text", nullable)]
    pub thumbnail: Option<String>,

    /// Uptime as displayed (e.g. "99.9%")
    pub uptime: Option<String>,

    /// Timestamp the camera was last seen online
    pub last_online: Option<DateTimeWithTimeZone>,

    /// Stream endpoint (RTSP/HLS/WebRTC URL)
    #[sea_orm(column_type = "Text", nullable)]
    pub stream_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
