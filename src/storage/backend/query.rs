//! Read-only queries for SeaOrmStorage.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, ExprTrait, Func},
};
use tracing::error;

use super::SeaOrmStorage;
use super::converters::model_to_qr_code;
use crate::errors::Result;
use crate::storage::models::{QrCode, QrCodeFilter, QrCodePage, QrSort};

use migration::entities::{click, qr_code};

/// Per-code click count aggregation row.
#[derive(Debug, FromQueryResult)]
struct ClickCountRow {
    qrcode_id: i64,
    count: i64,
}

impl SeaOrmStorage {
    pub async fn get_qr(&self, id: i64) -> Result<Option<QrCode>> {
        let model = qr_code::Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(model_to_qr_code))
    }

    pub async fn get_qr_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
        let model = qr_code::Entity::find()
            .filter(qr_code::Column::Slug.eq(slug))
            .one(self.db())
            .await?;
        Ok(model.map(model_to_qr_code))
    }

    /// Fast existence check used by the slug-generation retry loop.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = qr_code::Entity::find()
            .filter(qr_code::Column::Slug.eq(slug))
            .count(self.db())
            .await?;
        Ok(count > 0)
    }

    /// Filtered, paginated, sorted listing with per-record click counts.
    pub async fn list_qr(&self, filter: &QrCodeFilter) -> Result<QrCodePage> {
        let mut condition = Condition::all();

        if let Some(dynamic) = filter.dynamic {
            condition = condition.add(qr_code::Column::IsDynamic.eq(dynamic));
        }

        if let Some(ref search) = filter.search {
            if !search.is_empty() {
                // LOWER on both sides; plain LIKE is case-sensitive on
                // PostgreSQL.
                let pattern = format!("%{}%", search.to_lowercase());
                let ci_contains = |col: qr_code::Column| {
                    Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone())
                };
                condition = condition.add(
                    Condition::any()
                        .add(ci_contains(qr_code::Column::Title))
                        .add(ci_contains(qr_code::Column::Slug))
                        .add(ci_contains(qr_code::Column::Content)),
                );
            }
        }

        let base = qr_code::Entity::find().filter(condition);

        let total = base.clone().count(self.db()).await?;

        let page = std::cmp::Ord::max(filter.page, 1);
        let limit = filter.limit.clamp(1, 100);

        let sorted = match filter.sort {
            QrSort::CreatedAsc => base.order_by_asc(qr_code::Column::CreatedAt),
            QrSort::CreatedDesc => base.order_by_desc(qr_code::Column::CreatedAt),
            QrSort::TitleAsc => base.order_by_asc(qr_code::Column::Title),
            QrSort::TitleDesc => base.order_by_desc(qr_code::Column::Title),
        };

        let models = sorted
            .offset((page - 1) * limit)
            .limit(limit)
            .all(self.db())
            .await?;

        let mut items: Vec<QrCode> = models.into_iter().map(model_to_qr_code).collect();

        // One grouped aggregate for the whole page.
        let counts = self
            .click_counts_for(items.iter().map(|q| q.id).collect())
            .await;
        for item in &mut items {
            item.click_count = counts.get(&item.id).copied().unwrap_or(0);
        }

        Ok(QrCodePage {
            items,
            total,
            page,
            limit,
        })
    }

    async fn click_counts_for(&self, ids: Vec<i64>) -> HashMap<i64, u64> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let rows = click::Entity::find()
            .select_only()
            .column(click::Column::QrcodeId)
            .column_as(click::Column::Id.count(), "count")
            .filter(click::Column::QrcodeId.is_in(ids))
            .group_by(click::Column::QrcodeId)
            .into_model::<ClickCountRow>()
            .all(self.db())
            .await;

        match rows {
            Ok(rows) => rows
                .into_iter()
                .map(|r| (r.qrcode_id, std::cmp::Ord::max(r.count, 0) as u64))
                .collect(),
            Err(e) => {
                error!("Click count aggregation failed: {}", e);
                HashMap::new()
            }
        }
    }

    // Admin dashboard totals.

    pub async fn count_qr(&self) -> Result<u64> {
        Ok(qr_code::Entity::find().count(self.db()).await?)
    }

    pub async fn count_dynamic_qr(&self) -> Result<u64> {
        Ok(qr_code::Entity::find()
            .filter(qr_code::Column::IsDynamic.eq(true))
            .count(self.db())
            .await?)
    }

    pub async fn count_clicks(&self) -> Result<u64> {
        Ok(click::Entity::find().count(self.db()).await?)
    }
}
