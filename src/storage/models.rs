use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A QR code record.
///
/// Static codes encode `content` directly into the image and are immutable.
/// Dynamic codes encode `{base_url}/q/{slug}` and keep `content` as the
/// current redirect destination, mutable by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCode {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub is_dynamic: bool,
    #[serde(default)]
    pub options: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Aggregated click count, filled by list queries.
    #[serde(default)]
    pub click_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub id: i64,
    pub qrcode_id: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Success,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for ProcessingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown processing status: {}", other)),
        }
    }
}

/// Ledger entry for one remote file, keyed by its Dropbox path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub dropbox_path: String,
    pub filename: String,
    pub content_hash: String,
    pub qrcode_id: Option<i64>,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Sort orders accepted by the list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QrSort {
    CreatedAsc,
    #[default]
    CreatedDesc,
    TitleAsc,
    TitleDesc,
}

impl QrSort {
    pub fn parse(s: &str) -> Self {
        match s {
            "created_asc" => Self::CreatedAsc,
            "title_asc" => Self::TitleAsc,
            "title_desc" => Self::TitleDesc,
            _ => Self::CreatedDesc,
        }
    }
}

/// Filter and pagination for QR code listing.
#[derive(Debug, Clone, Default)]
pub struct QrCodeFilter {
    /// None lists both static and dynamic codes.
    pub dynamic: Option<bool>,
    /// Case-insensitive substring over title, slug and content.
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
    pub sort: QrSort,
}

#[derive(Debug, Clone)]
pub struct QrCodePage {
    pub items: Vec<QrCode>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl QrCodePage {
    pub fn pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.limit.max(1))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClickPage {
    pub items: Vec<Click>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl ClickPage {
    pub fn pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.limit.max(1))
        }
    }
}
