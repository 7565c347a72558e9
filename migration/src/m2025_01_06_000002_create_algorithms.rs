//! Migration to create the algorithms table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Algorithms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Algorithms::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Algorithms::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Algorithms::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Algorithms::Accuracy)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Algorithms::Status)
                            .string_len(16)
                            .not_null()
                            .default("offline"),
                    )
                    .col(ColumnDef::new(Algorithms::Icon).string_len(50).null())
                    .col(ColumnDef::new(Algorithms::Color).string_len(20).null())
                    .col(ColumnDef::new(Algorithms::Type).string_len(50).null())
                    .col(
                        ColumnDef::new(Algorithms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Algorithms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Algorithms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Algorithms {
    Table,
    Id,
    Name,
    Description,
    Accuracy,
    Status,
    Icon,
    Color,
    Type,
    CreatedAt,
    UpdatedAt,
}
