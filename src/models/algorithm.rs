//! Algorithm entity model
//!
//! AI detection algorithms shown in the algorithm library.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "algorithms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Reported detection accuracy as a percentage (0-100)
    pub accuracy: f64,

    /// `online` or `offline`, see [`super::AlgorithmStatus`]
    pub status: String,

    pub icon: Option<String>,

    pub color: Option<String>,

    /// Detection category (e.g. "vehicle", "pedestrian")
    #[sea_orm(column_name = "type")]
    pub kind: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
