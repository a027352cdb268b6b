//! Sales upload handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde_json::json;
use shared::{ActivityAction, EntityType};

use crate::error::AppResult;
use crate::handlers::upload::read_upload;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::sales::{HistoryQuery, SalesUpload, UploadResult};
use crate::services::{ActivityService, SalesService};
use crate::AppState;

fn sales_service(state: &AppState) -> SalesService {
    SalesService::new(
        state.db.clone(),
        state.pipeline.clone(),
        state.config.pipeline.tmp_dir.clone(),
    )
}

/// Ingest a sales spreadsheet (multipart field `file`)
pub async fn upload_sales(
    State(state): State<AppState>,
    staff: Staff,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResult>>> {
    let file = read_upload(&mut multipart, &["file"]).await?;
    let result = sales_service(&state)
        .upload(&file.filename, &file.data, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Uploaded,
            EntityType::SalesUpload,
            &result.upload_id,
            format!("Enviou a planilha de vendas {}", file.filename),
            Some(json!({ "status": result.status, "errors": result.errors.len() })),
        )
        .await;

    Ok(Json(ApiResponse::ok(result)))
}

pub async fn get_sales_history(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<ApiResponse<Vec<SalesUpload>>>> {
    let uploads = sales_service(&state).history(query).await?;
    Ok(Json(ApiResponse::list(uploads)))
}

pub async fn get_sales_upload(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<SalesUpload>>> {
    let upload = sales_service(&state).get_upload(&id).await?;
    Ok(Json(ApiResponse::ok(upload)))
}
