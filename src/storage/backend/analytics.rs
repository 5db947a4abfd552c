//! Click analytics queries.
//!
//! Per-day aggregation runs in SQL (backend-specific date formatting, the
//! same trick for sqlite/mysql/postgres); zero-filling into a fixed-length
//! window happens in the service layer.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

use super::SeaOrmStorage;
use super::converters::model_to_click;
use crate::errors::Result;
use crate::storage::models::ClickPage;

use migration::entities::click;

/// One aggregated day: label is the SQL-formatted date string.
#[derive(Debug, FromQueryResult)]
pub struct TrendRow {
    pub label: String,
    pub count: i64,
}

impl SeaOrmStorage {
    fn db_backend(&self) -> DbBackend {
        match self.get_backend_name() {
            "sqlite" => DbBackend::Sqlite,
            "mysql" => DbBackend::MySql,
            _ => DbBackend::Postgres,
        }
    }

    /// `YYYY-MM-DD` grouping expression for the current backend.
    fn day_format_expr(&self) -> Expr {
        match self.db_backend() {
            DbBackend::Sqlite => Expr::cust("strftime('%Y-%m-%d', timestamp)"),
            DbBackend::MySql => Expr::cust("DATE_FORMAT(timestamp, '%Y-%m-%d')"),
            _ => Expr::cust("TO_CHAR(timestamp, 'YYYY-MM-DD')"),
        }
    }

    /// Clicks per calendar day (UTC) for one code in `[start, end]`.
    ///
    /// Days without clicks are absent from the result.
    pub async fn get_qr_daily_clicks(
        &self,
        qrcode_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrendRow>> {
        let date_expr = self.day_format_expr();

        let rows = click::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(click::Column::Id.count(), "count")
            .filter(click::Column::QrcodeId.eq(qrcode_id))
            .filter(click::Column::Timestamp.gte(start))
            .filter(click::Column::Timestamp.lte(end))
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<TrendRow>()
            .all(self.db())
            .await?;

        Ok(rows)
    }

    /// Raw click history, newest first.
    pub async fn get_click_history(
        &self,
        qrcode_id: i64,
        page: u64,
        limit: u64,
    ) -> Result<ClickPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let base = click::Entity::find().filter(click::Column::QrcodeId.eq(qrcode_id));

        let total = base.clone().count(self.db()).await?;

        let models = base
            .order_by_desc(click::Column::Timestamp)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(self.db())
            .await?;

        Ok(ClickPage {
            items: models.into_iter().map(model_to_click).collect(),
            total,
            page,
            limit,
        })
    }

    /// Total clicks for one code inside a time window.
    pub async fn count_qr_clicks(
        &self,
        qrcode_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(click::Entity::find()
            .filter(click::Column::QrcodeId.eq(qrcode_id))
            .filter(click::Column::Timestamp.gte(start))
            .filter(click::Column::Timestamp.lte(end))
            .count(self.db())
            .await?)
    }
}
