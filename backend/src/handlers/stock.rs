//! Stock handlers: current levels, the movement ledger, adjustments and
//! draft orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use shared::{ActivityAction, EntityType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::drafts::{
    AddDraftItemInput, DraftChange, DraftOrder, FinalizeDraftInput, FinalizedDraft,
    UpdateDraftInput,
};
use crate::services::inventory::{
    AdjustStockInput, AdjustmentResult, PageQuery, StockMovement, StockOverview, StockQuery,
};
use crate::services::{ActivityService, DraftOrderService, InventoryService};
use crate::AppState;

fn draft_service(state: &AppState) -> DraftOrderService {
    DraftOrderService::new(state.db.clone(), state.config.restaurant.name.clone())
}

/// Current stock grouped by storage center, with derived status and value
pub async fn get_current_stock(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<ApiResponse<StockOverview>>> {
    let overview = InventoryService::new(state.db).current_stock(query).await?;
    Ok(Json(ApiResponse::ok(overview)))
}

pub async fn get_ingredient_movements(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<Vec<StockMovement>>>> {
    let movements = InventoryService::new(state.db)
        .ingredient_movements(id, page)
        .await?;
    Ok(Json(ApiResponse::list(movements)))
}

/// Set an absolute stock level
pub async fn adjust_stock(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<ApiResponse<AdjustmentResult>>> {
    let reason = input.reason.clone();
    let result = InventoryService::new(state.db.clone())
        .adjust(id, input, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Adjusted,
            EntityType::Ingredient,
            id,
            format!(
                "Ajustou o estoque de {} para {}",
                result.previous_stock, result.new_stock
            ),
            Some(json!({ "difference": result.difference, "reason": reason })),
        )
        .await;

    Ok(Json(
        ApiResponse::ok(result).with_message("Estoque ajustado com sucesso"),
    ))
}

// Draft orders

pub async fn list_draft_orders(
    State(state): State<AppState>,
    staff: Staff,
) -> AppResult<Json<ApiResponse<Vec<DraftOrder>>>> {
    let drafts = draft_service(&state).list(staff.id).await?;
    Ok(Json(ApiResponse::list(drafts)))
}

/// Add an item to the caller's cart for a supplier, creating the cart if needed
pub async fn add_draft_item(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<AddDraftItemInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<DraftChange>>)> {
    let change = draft_service(&state).add_item(input, staff.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(change))))
}

pub async fn update_draft_order(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateDraftInput>,
) -> AppResult<Json<ApiResponse<DraftOrder>>> {
    let draft = draft_service(&state).update(id, input).await?;
    Ok(Json(ApiResponse::ok(draft)))
}

pub async fn delete_draft_order(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    draft_service(&state).delete(id).await?;
    Ok(Json(ApiResponse::message("Rascunho removido")))
}

/// Turn a cart into a purchase with its receiving
pub async fn finalize_draft_order(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    body: Option<Json<FinalizeDraftInput>>,
) -> AppResult<(StatusCode, Json<ApiResponse<FinalizedDraft>>)> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let finalized = draft_service(&state).finalize(id, input, staff.id).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Finalized,
            EntityType::Purchase,
            finalized.purchase_id,
            format!(
                "Finalizou o pedido {}",
                finalized.order_number.as_deref().unwrap_or_default()
            ),
            Some(json!({ "draft_id": id, "receiving_id": finalized.receiving_id })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(finalized).with_message("Pedido criado com sucesso")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    #[tokio::test]
    async fn test_finalize_without_body_uses_stored_draft() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/stock/draft-orders/x/finalize")
            .body(Body::empty())
            .unwrap();
        let body = Option::<Json<FinalizeDraftInput>>::from_request(req, &())
            .await
            .unwrap();
        assert!(body.is_none());

        let input = body.map(|Json(b)| b).unwrap_or_default();
        assert!(input.items.is_none());
        assert!(input.order_date.is_none());
    }

    #[tokio::test]
    async fn test_finalize_with_overrides() {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"notes":"Entregar cedo"}"#))
            .unwrap();
        let Some(Json(input)) = Option::<Json<FinalizeDraftInput>>::from_request(req, &())
            .await
            .unwrap()
        else {
            panic!("body should parse");
        };
        assert_eq!(input.notes.as_deref(), Some("Entregar cedo"));
    }
}
