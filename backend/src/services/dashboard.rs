//! Dashboard aggregates

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{min_stock_ratio, percent_of, AlertPriority, AlertStatus, Confidence};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Window the dashboard counts recent sales over
const RECENT_SALES_DAYS: i64 = 7;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

#[derive(Debug, Serialize)]
pub struct IngredientOverview {
    pub total: i64,
    pub below_minimum: i64,
    pub percent_below_minimum: i64,
}

#[derive(Debug, Serialize)]
pub struct AlertOverview {
    pub pending: i64,
    pub critical: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LastUpload {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub sales_created: i32,
}

#[derive(Debug, Serialize)]
pub struct SalesOverview {
    pub last_7_days: i64,
    pub last_upload: Option<LastUpload>,
}

#[derive(Debug, Serialize)]
pub struct MappingOverview {
    pub total: i64,
    pub mapped: i64,
    pub percent: i64,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub operational: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub ingredients: IngredientOverview,
    pub alerts: AlertOverview,
    pub sales: SalesOverview,
    pub mappings: MappingOverview,
    pub system_status: SystemStatus,
}

/// An ingredient under its minimum stock
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShortIngredient {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub storage_center: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[sqlx(skip)]
    pub stock_ratio: Decimal,
}

#[derive(sqlx::FromRow)]
struct Counts {
    total: i64,
    flagged: i64,
}

fn share(part: i64, total: i64) -> i64 {
    percent_of(part.max(0) as usize, total.max(0) as usize)
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn summary(&self) -> AppResult<DashboardSummary> {
        let ingredients = sqlx::query_as::<_, Counts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE current_stock < min_stock) AS flagged
            FROM ingredients
            WHERE status = 'active'
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let alerts = sqlx::query_as::<_, Counts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE priority = $2) AS flagged
            FROM alerts
            WHERE status = $1
            "#,
        )
        .bind(AlertStatus::Pending.as_str())
        .bind(AlertPriority::High.as_str())
        .fetch_one(&self.db)
        .await?;

        let since = (Utc::now() - Duration::days(RECENT_SALES_DAYS)).date_naive();
        let recent_sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_date >= $1")
            .bind(since)
            .fetch_one(&self.db)
            .await?;

        let last_upload = sqlx::query_as::<_, LastUpload>(
            r#"
            SELECT filename, uploaded_at, sales_created
            FROM sales_uploads
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;

        let mappings = sqlx::query_as::<_, Counts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE confidence IN ($1, $2)) AS flagged
            FROM product_mappings
            "#,
        )
        .bind(Confidence::AutoHigh.as_str())
        .bind(Confidence::Manual.as_str())
        .fetch_one(&self.db)
        .await?;

        let last_sync = last_upload.as_ref().map(|u| u.uploaded_at);

        Ok(DashboardSummary {
            ingredients: IngredientOverview {
                total: ingredients.total,
                below_minimum: ingredients.flagged,
                percent_below_minimum: share(ingredients.flagged, ingredients.total),
            },
            alerts: AlertOverview {
                pending: alerts.total,
                critical: alerts.flagged,
            },
            sales: SalesOverview {
                last_7_days: recent_sales,
                last_upload,
            },
            mappings: MappingOverview {
                total: mappings.total,
                mapped: mappings.flagged,
                percent: share(mappings.flagged, mappings.total),
            },
            system_status: SystemStatus {
                operational: true,
                last_sync,
            },
        })
    }

    /// Active ingredients under their minimum, most depleted first
    pub async fn below_minimum(&self) -> AppResult<Vec<ShortIngredient>> {
        let mut rows = sqlx::query_as::<_, ShortIngredient>(
            r#"
            SELECT id, name, category, unit, current_stock, min_stock, storage_center, supplier_id
            FROM ingredients
            WHERE status = 'active' AND current_stock < min_stock
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        for row in rows.iter_mut() {
            row.stock_ratio = min_stock_ratio(row.current_stock, row.min_stock);
        }
        rows.sort_by(|a, b| a.stock_ratio.cmp(&b.stock_ratio).then_with(|| a.name.cmp(&b.name)));

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_handles_empty_tables() {
        assert_eq!(share(0, 0), 0);
        assert_eq!(share(1, 4), 25);
    }
}
