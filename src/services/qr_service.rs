//! QR code lifecycle: slug allocation, validation and CRUD.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{QrGenError, Result};
use crate::storage::{QrCode, QrCodeFilter, QrCodePage, QrCodeUpdate, SeaOrmStorage};
use crate::utils::{generate_slug, url_validator::validate_qr_content};

/// How many random slugs to try before giving up. After half the attempts
/// the slug is lengthened by one character to shrink the collision space.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Partial update accepted for a QR code.
#[derive(Debug, Clone, Default)]
pub struct QrPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_dynamic: Option<bool>,
    pub options: Option<HashMap<String, Value>>,
}

impl QrPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.is_dynamic.is_none()
            && self.options.is_none()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AdminStats {
    pub total_codes: u64,
    pub dynamic_codes: u64,
    pub static_codes: u64,
    pub total_clicks: u64,
}

/// QR code service. Holds the storage handle and the pieces of
/// configuration it needs; constructed once in `main` and shared.
#[derive(Clone)]
pub struct QrService {
    storage: SeaOrmStorage,
    base_url: String,
    slug_length: usize,
}

impl QrService {
    pub fn new(storage: SeaOrmStorage, base_url: &str, slug_length: usize) -> Self {
        QrService {
            storage,
            base_url: base_url.trim_end_matches('/').to_string(),
            slug_length,
        }
    }

    pub fn storage(&self) -> &SeaOrmStorage {
        &self.storage
    }

    /// The URL a scanner lands on: the redirect route for dynamic codes,
    /// the stored content itself for static ones.
    pub fn scan_target(&self, qr: &QrCode) -> String {
        if qr.is_dynamic {
            self.redirect_url(&qr.slug)
        } else {
            qr.content.clone()
        }
    }

    pub fn redirect_url(&self, slug: &str) -> String {
        format!("{}/q/{}", self.base_url, slug)
    }

    /// Mint a slug that no existing code uses.
    async fn allocate_slug(&self) -> Result<String> {
        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let length = self.slug_length + attempt / (MAX_SLUG_ATTEMPTS / 2);
            let candidate = generate_slug(length);
            if !self.storage.slug_exists(&candidate).await? {
                debug!("Allocated slug {} (attempt {})", candidate, attempt + 1);
                return Ok(candidate);
            }
        }
        Err(QrGenError::database_operation(
            "Could not allocate a unique slug",
        ))
    }

    pub async fn create(
        &self,
        title: &str,
        content: &str,
        is_dynamic: bool,
        options: HashMap<String, Value>,
    ) -> Result<QrCode> {
        if content.trim().is_empty() {
            return Err(QrGenError::validation("Content must not be empty"));
        }
        validate_qr_content(content).map_err(|e| QrGenError::validation(e.to_string()))?;

        let slug = self.allocate_slug().await?;
        let qr = self
            .storage
            .create_qr(&slug, title, content, is_dynamic, &options)
            .await?;
        info!(
            "Created {} QR code {} ({})",
            if is_dynamic { "dynamic" } else { "static" },
            qr.slug,
            qr.id
        );
        Ok(qr)
    }

    pub async fn get(&self, id: i64) -> Result<QrCode> {
        self.storage
            .get_qr(id)
            .await?
            .ok_or_else(|| QrGenError::not_found(format!("QR code {} not found", id)))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<QrCode> {
        self.storage
            .get_qr_by_slug(slug)
            .await?
            .ok_or_else(|| QrGenError::not_found(format!("Slug '{}' not found", slug)))
    }

    pub async fn list(&self, filter: &QrCodeFilter) -> Result<QrCodePage> {
        self.storage.list_qr(filter).await
    }

    /// Apply a partial update. Only dynamic codes may change: a static
    /// code's content is already baked into printed images.
    pub async fn update(&self, id: i64, patch: QrPatch) -> Result<QrCode> {
        let existing = self.get(id).await?;
        if !existing.is_dynamic {
            return Err(QrGenError::forbidden(
                "Static QR codes cannot be modified; create a new one instead",
            ));
        }
        if let Some(content) = patch.content.as_deref() {
            if content.trim().is_empty() {
                return Err(QrGenError::validation("Content must not be empty"));
            }
            validate_qr_content(content).map_err(|e| QrGenError::validation(e.to_string()))?;
        }

        self.storage
            .update_qr(
                id,
                QrCodeUpdate {
                    title: patch.title,
                    content: patch.content,
                    is_dynamic: patch.is_dynamic,
                    options: patch.options,
                },
            )
            .await
    }

    /// Redirect dynamic codes without touching title or options. Used by
    /// the automation pipeline once the final destination is known.
    pub async fn repoint(&self, id: i64, content: &str) -> Result<QrCode> {
        self.update(
            id,
            QrPatch {
                content: Some(content.to_string()),
                ..QrPatch::default()
            },
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.storage.delete_qr(id).await?;
        info!("Deleted QR code {}", id);
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.storage.delete_all_qr().await
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let total_codes = self.storage.count_qr().await?;
        let dynamic_codes = self.storage.count_dynamic_qr().await?;
        let total_clicks = self.storage.count_clicks().await?;
        Ok(AdminStats {
            total_codes,
            dynamic_codes,
            static_codes: total_codes - dynamic_codes,
            total_clicks,
        })
    }
}
