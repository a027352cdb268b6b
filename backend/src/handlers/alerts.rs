//! Alert handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{ActivityAction, AlertStats, EntityType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::alerts::{Alert, AlertQuery, CreateAlertInput};
use crate::services::{ActivityService, AlertService};
use crate::AppState;

pub async fn list_alerts(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<ApiResponse<Vec<Alert>>>> {
    let alerts = AlertService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(alerts)))
}

/// Pending alerts by priority and type
pub async fn get_alert_stats(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<AlertStats>>> {
    let stats = AlertService::new(state.db).stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn get_alert(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Alert>>> {
    let alert = AlertService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

pub async fn create_alert(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreateAlertInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Alert>>)> {
    let alert = AlertService::new(state.db.clone()).create(input).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::Alert,
            alert.id,
            format!("Criou o alerta {}", alert.title),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(alert))))
}
