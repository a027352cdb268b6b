//! Dashboard and report handlers

use axum::{
    extract::{Query, State},
    Json,
};
use shared::SalesByProduct;

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::dashboard::{DashboardSummary, ShortIngredient};
use crate::services::reporting::{SalesReportQuery, StockValueReport};
use crate::services::{DashboardService, ReportingService};
use crate::AppState;

pub async fn get_dashboard_summary(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let summary = DashboardService::new(state.db).summary().await?;
    Ok(Json(ApiResponse::ok(summary)))
}

pub async fn get_below_minimum(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<Vec<ShortIngredient>>>> {
    let ingredients = DashboardService::new(state.db).below_minimum().await?;
    Ok(Json(ApiResponse::list(ingredients)))
}

/// Sales over the last `days` (default 7) grouped by product
pub async fn get_sales_by_product(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Json<ApiResponse<SalesByProduct>>> {
    let report = ReportingService::new(state.db).sales_by_product(query).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn get_stock_value(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<StockValueReport>>> {
    let report = ReportingService::new(state.db).stock_value().await?;
    Ok(Json(ApiResponse::ok(report)))
}
