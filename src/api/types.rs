//! Request and response types for the HTTP API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{QrCode, QrCodePage};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

fn default_false() -> bool {
    false
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQrRequest {
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default = "default_false")]
    pub is_dynamic: bool,
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQrRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_dynamic: Option<bool>,
    pub options: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// Filter to dynamic (`true`) or static (`false`) codes.
    pub dynamic: Option<bool>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageQuery {
    pub size: Option<u32>,
    /// "png" (default) or "svg".
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClicksQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualProcessRequest {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChallenge {
    pub challenge: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodeResponse {
    #[serde(flatten)]
    pub qr: QrCode,
    /// What a scanner of the printed image ends up requesting.
    pub scan_target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodeListResponse {
    pub items: Vec<QrCodeResponse>,
    pub pagination: PaginationInfo,
}

impl QrCodeListResponse {
    pub fn from_page(page: QrCodePage, mut scan_target: impl FnMut(&QrCode) -> String) -> Self {
        let pagination = PaginationInfo {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        };
        QrCodeListResponse {
            items: page
                .items
                .into_iter()
                .map(|qr| {
                    let scan_target = scan_target(&qr);
                    QrCodeResponse { qr, scan_target }
                })
                .collect(),
            pagination,
        }
    }
}
