//! Processing ledger operations.
//!
//! The ledger makes the Dropbox watcher idempotent: one row per remote path,
//! upserted in place after every processing attempt. Rows are never deleted.

use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, QueryOrder};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::{model_to_processed_file, processed_file_to_active_model};
use crate::errors::Result;
use crate::storage::models::ProcessedFile;

use migration::entities::processed_file;

impl SeaOrmStorage {
    pub async fn get_processed_file(&self, dropbox_path: &str) -> Result<Option<ProcessedFile>> {
        let model = processed_file::Entity::find_by_id(dropbox_path)
            .one(self.db())
            .await?;
        Ok(model.map(model_to_processed_file))
    }

    /// Insert or overwrite the ledger entry for a path (last writer wins).
    pub async fn upsert_processed_file(&self, entry: &ProcessedFile) -> Result<()> {
        let active = processed_file_to_active_model(entry);

        processed_file::Entity::insert(active)
            .on_conflict(
                OnConflict::column(processed_file::Column::DropboxPath)
                    .update_columns([
                        processed_file::Column::Filename,
                        processed_file::Column::ContentHash,
                        processed_file::Column::QrcodeId,
                        processed_file::Column::Status,
                        processed_file::Column::ErrorMessage,
                        processed_file::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db())
            .await?;

        debug!(
            "Ledger upserted: {} ({})",
            entry.dropbox_path,
            entry.status.as_str()
        );
        Ok(())
    }

    pub async fn list_processed_files(&self) -> Result<Vec<ProcessedFile>> {
        let models = processed_file::Entity::find()
            .order_by_desc(processed_file::Column::UpdatedAt)
            .all(self.db())
            .await?;
        Ok(models.into_iter().map(model_to_processed_file).collect())
    }
}
