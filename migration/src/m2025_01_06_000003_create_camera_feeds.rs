//! Migration to create the camera_feeds table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CameraFeeds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CameraFeeds::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CameraFeeds::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(CameraFeeds::Location)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CameraFeeds::Ip).string_len(50).null())
                    .col(ColumnDef::new(CameraFeeds::Latency).string_len(20).null())
                    .col(
                        ColumnDef::new(CameraFeeds::Status)
                            .string_len(16)
                            .not_null()
                            .default("offline"),
                    )
                    .col(ColumnDef::new(CameraFeeds::Thumbnail).text().null())
                    .col(ColumnDef::new(CameraFeeds::Uptime).string_len(50).null())
                    .col(
                        ColumnDef::new(CameraFeeds::LastOnline)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(CameraFeeds::StreamUrl).text().null())
                    .col(
                        ColumnDef::new(CameraFeeds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CameraFeeds::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_camera_feeds_status")
                    .table(CameraFeeds::Table)
                    .col(CameraFeeds::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CameraFeeds::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CameraFeeds {
    Table,
    Id,
    Name,
    Location,
    Ip,
    Latency,
    Status,
    Thumbnail,
    Uptime,
    LastOnline,
    StreamUrl,
    CreatedAt,
    UpdatedAt,
}
