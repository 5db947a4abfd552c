//! Initial schema: qr_codes, clicks and processed_files.
//!
//! - `qr_codes` holds both static and dynamic codes; the slug is the public
//!   identifier embedded in redirect URLs and must be unique.
//! - `clicks` is the per-redirect event log (manual cascade from qr_codes).
//! - `processed_files` is the Dropbox pipeline ledger, keyed by remote path.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QrCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QrCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QrCodes::Slug).string_len(32).not_null())
                    .col(
                        ColumnDef::new(QrCodes::Title)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(QrCodes::Content).text().not_null())
                    .col(
                        ColumnDef::new(QrCodes::IsDynamic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(QrCodes::Options).json().not_null())
                    .col(
                        ColumnDef::new(QrCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QrCodes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Slug lookups are the redirect hot path.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qr_codes_slug")
                    .table(QrCodes::Table)
                    .col(QrCodes::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qr_codes_created_at")
                    .table(QrCodes::Table)
                    .col(QrCodes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clicks::QrcodeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Clicks::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Clicks::Ip).string_len(64).null())
                    .col(ColumnDef::new(Clicks::UserAgent).text().null())
                    .col(ColumnDef::new(Clicks::Country).string_len(2).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_qrcode_id")
                    .table(Clicks::Table)
                    .col(Clicks::QrcodeId)
                    .to_owned(),
            )
            .await?;

        // Composite index for per-code time-series queries.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_qrcode_time")
                    .table(Clicks::Table)
                    .col(Clicks::QrcodeId)
                    .col(Clicks::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProcessedFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcessedFiles::DropboxPath)
                            .string_len(1024)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProcessedFiles::Filename)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcessedFiles::ContentHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProcessedFiles::QrcodeId).big_integer().null())
                    .col(ColumnDef::new(ProcessedFiles::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ProcessedFiles::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(ProcessedFiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProcessedFiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clicks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QrCodes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
    Slug,
    Title,
    Content,
    IsDynamic,
    Options,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Clicks {
    Table,
    Id,
    QrcodeId,
    Timestamp,
    Ip,
    UserAgent,
    Country,
}

#[derive(DeriveIden)]
enum ProcessedFiles {
    Table,
    DropboxPath,
    Filename,
    ContentHash,
    QrcodeId,
    Status,
    ErrorMessage,
    UpdatedAt,
}
