//! User profile entity model
//!
//! Profiles are keyed by the identity provider's user id. The `role` column
//! is the source of truth for endpoint authorization.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    /// Identity provider user id (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: Option<String>,

    pub email: String,

    /// `admin`, `operator` or `viewer`
    pub role: String,

    /// `active` or `inactive`
    pub status: String,

    /// JSON array of permission strings
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub permissions: Option<JsonValue>,

    pub last_login: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Permission strings, skipping anything in the column that is not a string
    pub fn permission_list(&self) -> Vec<String> {
        self.permissions
            .as_ref()
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
