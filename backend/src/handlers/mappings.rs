//! SKU mapping handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use shared::{ActivityAction, EntityType, MappingStats};

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::mappings::{MappingQuery, ProductMapping, UpdateMappingInput};
use crate::services::{ActivityService, MappingService};
use crate::AppState;

pub async fn list_mappings(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<MappingQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductMapping>>>> {
    let mappings = MappingService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(mappings)))
}

pub async fn get_mapping_stats(
    State(state): State<AppState>,
    _staff: Staff,
) -> AppResult<Json<ApiResponse<MappingStats>>> {
    let stats = MappingService::new(state.db).stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn get_mapping_by_sku(
    State(state): State<AppState>,
    _staff: Staff,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<ProductMapping>>> {
    let mapping = MappingService::new(state.db).get_by_sku(&sku).await?;
    Ok(Json(ApiResponse::ok(mapping)))
}

pub async fn update_mapping(
    State(state): State<AppState>,
    staff: Staff,
    Path(sku): Path<String>,
    Json(input): Json<UpdateMappingInput>,
) -> AppResult<Json<ApiResponse<ProductMapping>>> {
    let mapping = MappingService::new(state.db.clone()).update(&sku, input).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Updated,
            EntityType::Mapping,
            &mapping.sku,
            format!("Revisou o mapeamento do SKU {}", mapping.sku),
            Some(json!({ "recipe_id": mapping.recipe_id, "confidence": mapping.confidence })),
        )
        .await;

    Ok(Json(ApiResponse::ok(mapping)))
}
