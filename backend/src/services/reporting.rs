//! Reporting service for sales and stock valuation

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{aggregate_sales, category_label, stock_value, SaleLine, SalesByProduct};
use sqlx::PgPool;

use crate::error::AppResult;

const DEFAULT_REPORT_DAYS: i64 = 7;
const MAX_REPORT_DAYS: i64 = 366;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct SalesReportQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub name: String,
    pub value: Decimal,
}

/// Value of the stock on hand, overall and per category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockValueReport {
    pub total_value: Decimal,
    pub categories: Vec<CategoryValue>,
    pub total_ingredients: usize,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    sku: Option<String>,
    product_name: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ValuedStock {
    pub category: String,
    pub current_stock: Decimal,
    pub price: Decimal,
    pub gross_qty: Decimal,
}

pub(crate) fn value_by_category(rows: &[ValuedStock]) -> StockValueReport {
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let value = stock_value(row.current_stock, row.price, row.gross_qty);
        let entry = by_category.entry(row.category.clone()).or_default();
        *entry = entry.saturating_add(value);
    }

    StockValueReport {
        total_value: by_category
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v)),
        categories: by_category
            .into_iter()
            .map(|(category, value)| CategoryValue {
                name: category_label(&category),
                value,
            })
            .collect(),
        total_ingredients: rows.len(),
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Sales since `today - days`, grouped by product and ranked by revenue
    pub async fn sales_by_product(&self, query: SalesReportQuery) -> AppResult<SalesByProduct> {
        let days = query
            .days
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_REPORT_DAYS)
            .min(MAX_REPORT_DAYS);
        let since = (Utc::now() - Duration::days(days)).date_naive();

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT sku, product_name, quantity, unit_price
            FROM sales
            WHERE sale_date >= $1
            ORDER BY sale_date ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let lines: Vec<SaleLine> = rows
            .into_iter()
            .map(|r| SaleLine {
                sku: r.sku,
                product_name: r.product_name,
                quantity: r.quantity,
                unit_price: r.unit_price,
            })
            .collect();

        Ok(aggregate_sales(&lines))
    }

    pub async fn stock_value(&self) -> AppResult<StockValueReport> {
        let rows = sqlx::query_as::<_, ValuedStock>(
            "SELECT category, current_stock, price, gross_qty FROM ingredients WHERE status = 'active'",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(value_by_category(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, stock: i64, price: i64, gross: i64) -> ValuedStock {
        ValuedStock {
            category: category.to_string(),
            current_stock: Decimal::from(stock),
            price: Decimal::from(price),
            gross_qty: Decimal::from(gross),
        }
    }

    #[test]
    fn test_value_by_category() {
        let report = value_by_category(&[
            row("perecivel", 10, 50, 5),
            row("perecivel", 2, 10, 1),
            row("bebida", 3, 12, 6),
            row("outros", 1, 7, 0),
        ]);

        assert_eq!(report.total_ingredients, 4);
        assert_eq!(report.total_value, Decimal::from(100 + 20 + 6 + 7));

        let perecivel = report.categories.iter().find(|c| c.name == "Perecível").unwrap();
        assert_eq!(perecivel.value, Decimal::from(120));
        assert!(report.categories.iter().any(|c| c.name == "Bebida"));
        assert!(report.categories.iter().any(|c| c.name == "outros"));
    }

    #[test]
    fn test_empty_stock_is_worth_nothing() {
        let report = value_by_category(&[]);
        assert_eq!(report.total_value, Decimal::ZERO);
        assert!(report.categories.is_empty());
    }
}
