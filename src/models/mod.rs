//! # Data Models
//!
//! SeaORM entities for every dashboard table plus the typed status enums
//! used to validate their string columns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod algorithm;
pub mod camera_feed;
pub mod event_log;
pub mod notification;
pub mod report;
pub mod status;
pub mod system_setting;
pub mod user_profile;

pub use algorithm::Entity as Algorithm;
pub use camera_feed::Entity as CameraFeed;
pub use event_log::Entity as EventLog;
pub use notification::Entity as Notification;
pub use report::Entity as Report;
pub use status::{
    AlgorithmStatus, CameraStatus, EventStatus, ParseStatusError, RiskLevel, Role, UserStatus,
};
pub use system_setting::Entity as SystemSetting;
pub use user_profile::Entity as UserProfile;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "digital-eye-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
