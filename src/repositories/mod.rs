//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for the dashboard tables. Each repository borrows the pool and
//! returns [`crate::error::RepositoryError`].

pub mod algorithm;
pub mod camera_feed;
pub mod event_log;
pub mod notification;
pub mod report;
pub mod system_setting;
pub mod user_profile;

pub use algorithm::{AlgorithmInput, AlgorithmRepository};
pub use camera_feed::{CameraFeedRepository, CameraInput};
pub use event_log::{EventFilter, EventInput, EventLogRepository, EventRecord, EventStats};
pub use notification::{NewNotification, NotificationRecord, NotificationRepository};
pub use report::{ReportInput, ReportRepository};
pub use system_setting::{SettingWrite, SystemSettingRepository};
pub use user_profile::{NewUserProfile, ProfileUpdate, UserProfileRepository};
