//! Database migrations for the Digital Eye operations API.
//!
//! Each migration owns one table of the dashboard schema.

pub use sea_orm_migration::prelude::*;

mod m2025_01_06_000001_create_user_profiles;
mod m2025_01_06_000002_create_algorithms;
mod m2025_01_06_000003_create_camera_feeds;
mod m2025_01_06_000004_create_event_logs;
mod m2025_01_06_000005_create_notifications;
mod m2025_01_06_000006_create_system_settings;
mod m2025_01_06_000007_create_reports;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_06_000001_create_user_profiles::Migration),
            Box::new(m2025_01_06_000002_create_algorithms::Migration),
            Box::new(m2025_01_06_000003_create_camera_feeds::Migration),
            Box::new(m2025_01_06_000004_create_event_logs::Migration),
            Box::new(m2025_01_06_000005_create_notifications::Migration),
            Box::new(m2025_01_06_000006_create_system_settings::Migration),
            Box::new(m2025_01_06_000007_create_reports::Migration),
        ]
    }
}
