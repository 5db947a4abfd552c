//! Processing ledger entity for the Dropbox pipeline.
//!
//! Keyed by the remote file path; upserted in place after every processing
//! attempt so rescans of unchanged folders are no-ops.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "processed_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dropbox_path: String,
    pub filename: String,
    /// Dropbox content hash of the revision last attempted.
    pub content_hash: String,
    /// Weak reference to the QR code created on success.
    pub qrcode_id: Option<i64>,
    /// "success" or "error".
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
