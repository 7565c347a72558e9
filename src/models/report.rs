//! Report entity model
//!
//! Metadata for generated reports; the report file itself lives at `file_url`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,

    #[sea_orm(column_name = "type")]
    pub kind: Option<String>,

    pub date_range_start: Option<DateTimeWithTimeZone>,

    pub date_range_end: Option<DateTimeWithTimeZone>,

    /// Profile id of the user who generated the report
    pub generated_by: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub file_url: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
