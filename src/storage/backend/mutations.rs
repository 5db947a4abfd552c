//! Write operations for SeaOrmStorage.

use std::collections::HashMap;

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{model_to_qr_code, options_to_json};
use crate::errors::{QrGenError, Result};
use crate::storage::models::QrCode;

use migration::entities::{click, qr_code};

/// Partial update payload; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct QrCodeUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_dynamic: Option<bool>,
    pub options: Option<HashMap<String, Value>>,
}

impl SeaOrmStorage {
    pub async fn create_qr(
        &self,
        slug: &str,
        title: &str,
        content: &str,
        is_dynamic: bool,
        options: &HashMap<String, Value>,
    ) -> Result<QrCode> {
        let now = chrono::Utc::now();

        let model = qr_code::ActiveModel {
            id: NotSet,
            slug: Set(slug.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            is_dynamic: Set(is_dynamic),
            options: Set(options_to_json(options)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await?;

        info!("QR code created: {} (slug {})", model.id, model.slug);
        Ok(model_to_qr_code(model))
    }

    /// Apply a partial update and bump `updated_at`.
    ///
    /// Guard rules (dynamic-only mutation) live in the service layer; this
    /// is a plain row update.
    pub async fn update_qr(&self, id: i64, update: QrCodeUpdate) -> Result<QrCode> {
        let existing = qr_code::Entity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or_else(|| QrGenError::not_found(format!("QR code not found: {}", id)))?;

        let mut active: qr_code::ActiveModel = existing.into();

        if let Some(title) = update.title {
            active.title = Set(title);
        }
        if let Some(content) = update.content {
            active.content = Set(content);
        }
        if let Some(is_dynamic) = update.is_dynamic {
            active.is_dynamic = Set(is_dynamic);
        }
        if let Some(options) = update.options {
            active.options = Set(options_to_json(&options));
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db()).await?;
        info!("QR code updated: {}", id);
        Ok(model_to_qr_code(model))
    }

    /// Delete one QR code, cascading its clicks first.
    pub async fn delete_qr(&self, id: i64) -> Result<()> {
        click::Entity::delete_many()
            .filter(click::Column::QrcodeId.eq(id))
            .exec(self.db())
            .await?;

        let result = qr_code::Entity::delete_by_id(id).exec(self.db()).await?;
        if result.rows_affected == 0 {
            return Err(QrGenError::not_found(format!("QR code not found: {}", id)));
        }

        info!("QR code deleted: {}", id);
        Ok(())
    }

    /// Clear everything: clicks first, then codes. Returns codes deleted.
    pub async fn delete_all_qr(&self) -> Result<u64> {
        click::Entity::delete_many().exec(self.db()).await?;
        let result = qr_code::Entity::delete_many().exec(self.db()).await?;

        info!("All QR codes deleted ({} rows)", result.rows_affected);
        Ok(result.rows_affected)
    }

    pub async fn insert_click(
        &self,
        qrcode_id: i64,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<()> {
        click::ActiveModel {
            id: NotSet,
            qrcode_id: Set(qrcode_id),
            timestamp: Set(chrono::Utc::now()),
            ip: Set(ip),
            user_agent: Set(user_agent),
            country: Set(None),
        }
        .insert(self.db())
        .await?;
        Ok(())
    }
}
