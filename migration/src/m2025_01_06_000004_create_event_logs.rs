//! Migration to create the event_logs table.
//!
//! Events optionally reference the camera that observed them and the
//! algorithm that raised them. Both references are nulled when the parent
//! row is deleted so the event history survives.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventLogs::Time)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(EventLogs::Location).string_len(200).not_null())
                    .col(ColumnDef::new(EventLogs::Type).string_len(50).not_null())
                    .col(
                        ColumnDef::new(EventLogs::RiskLevel)
                            .string_len(16)
                            .not_null()
                            .default("low"),
                    )
                    .col(
                        ColumnDef::new(EventLogs::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(EventLogs::CameraId).uuid().null())
                    .col(ColumnDef::new(EventLogs::AlgorithmId).uuid().null())
                    .col(ColumnDef::new(EventLogs::Description).text().null())
                    .col(ColumnDef::new(EventLogs::SnapshotUrl).text().null())
                    .col(
                        ColumnDef::new(EventLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EventLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_logs_camera_id")
                            .from(EventLogs::Table, EventLogs::CameraId)
                            .to(CameraFeeds::Table, CameraFeeds::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_logs_algorithm_id")
                            .from(EventLogs::Table, EventLogs::AlgorithmId)
                            .to(Algorithms::Table, Algorithms::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing and export always sort by time descending
        manager
            .create_index(
                Index::create()
                    .name("idx_event_logs_time")
                    .table(EventLogs::Table)
                    .col(EventLogs::Time)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_logs_status_risk")
                    .table(EventLogs::Table)
                    .col(EventLogs::Status)
                    .col(EventLogs::RiskLevel)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_event_logs_status_risk").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_event_logs_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventLogs {
    Table,
    Id,
    Time,
    Location,
    Type,
    RiskLevel,
    Status,
    CameraId,
    AlgorithmId,
    Description,
    SnapshotUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CameraFeeds {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Algorithms {
    Table,
    Id,
}
