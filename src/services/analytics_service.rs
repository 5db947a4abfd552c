//! Click analytics: zero-filled daily series and raw history.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::errors::{QrGenError, Result};
use crate::storage::{ClickPage, SeaOrmStorage};

const MAX_TREND_DAYS: i64 = 365;
pub const DEFAULT_TREND_DAYS: i64 = 30;

/// Daily click series over a trailing window. `labels` and `series` have
/// exactly `days` entries, oldest day first; days without clicks are zero.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub qrcode_id: i64,
    pub days: i64,
    pub labels: Vec<String>,
    pub series: Vec<u64>,
    pub total: u64,
}

#[derive(Clone)]
pub struct AnalyticsService {
    storage: SeaOrmStorage,
}

impl AnalyticsService {
    pub fn new(storage: SeaOrmStorage) -> Self {
        AnalyticsService { storage }
    }

    pub async fn daily_trend(&self, qrcode_id: i64, days: i64) -> Result<TrendReport> {
        let days = days.clamp(1, MAX_TREND_DAYS);

        if self.storage.get_qr(qrcode_id).await?.is_none() {
            return Err(QrGenError::not_found(format!(
                "QR code {} not found",
                qrcode_id
            )));
        }

        let end = Utc::now();
        let start = (end - Duration::days(days - 1))
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let rows = self
            .storage
            .get_qr_daily_clicks(qrcode_id, start, end)
            .await?;
        let counts: HashMap<String, u64> = rows
            .into_iter()
            .map(|r| (r.label, r.count.max(0) as u64))
            .collect();

        let mut labels = Vec::with_capacity(days as usize);
        let mut series = Vec::with_capacity(days as usize);
        for offset in (0..days).rev() {
            let day = (end - Duration::days(offset)).date_naive();
            let label = day.format("%Y-%m-%d").to_string();
            series.push(counts.get(&label).copied().unwrap_or(0));
            labels.push(label);
        }

        let total = series.iter().sum();
        Ok(TrendReport {
            qrcode_id,
            days,
            labels,
            series,
            total,
        })
    }

    pub async fn click_history(&self, qrcode_id: i64, page: u64, limit: u64) -> Result<ClickPage> {
        if self.storage.get_qr(qrcode_id).await?.is_none() {
            return Err(QrGenError::not_found(format!(
                "QR code {} not found",
                qrcode_id
            )));
        }
        self.storage.get_click_history(qrcode_id, page, limit).await
    }
}
