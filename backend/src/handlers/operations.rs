//! Operations handlers: purchases, receivings, inventory counts and the
//! stock movement ledger

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use shared::{ActivityAction, ChecklistUpdate, EntityType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::upload::read_upload;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::counts::{
    CancelCountInput, CompletedCount, CountQuery, InventoryCount, StartCountInput,
    UpdateCountInput,
};
use crate::services::inventory::{MovementQuery, StockMovement};
use crate::services::purchasing::{
    CancelPurchaseInput, CreatePurchaseInput, Purchase, PurchaseQuery, UpdatePurchaseInput,
};
use crate::services::receiving::{
    CompleteReceivingInput, CompletedReceiving, Receiving, ReceivingQuery,
};
use crate::services::{
    ActivityService, CountService, InventoryService, PurchaseService, ReceivingService,
};
use crate::AppState;

fn receiving_service(state: &AppState) -> ReceivingService {
    ReceivingService::new(state.db.clone(), state.storage.clone())
}

// Purchases

pub async fn list_purchases(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<PurchaseQuery>,
) -> AppResult<Json<ApiResponse<Vec<Purchase>>>> {
    let purchases = PurchaseService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(purchases)))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Purchase>>> {
    let purchase = PurchaseService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(purchase)))
}

/// Create a purchase together with its receiving
pub async fn create_purchase(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<CreatePurchaseInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Purchase>>)> {
    let purchase = PurchaseService::new(state.db.clone())
        .create(input, staff.id)
        .await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::Purchase,
            purchase.id,
            format!(
                "Criou o pedido {} para {}",
                purchase.order_number.as_deref().unwrap_or_default(),
                purchase.supplier_name
            ),
            Some(json!({ "total_value": purchase.total_value, "receiving_id": purchase.receiving_id })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(purchase))))
}

pub async fn update_purchase(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseInput>,
) -> AppResult<Json<ApiResponse<Purchase>>> {
    let purchase = PurchaseService::new(state.db.clone()).update(id, input).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Updated,
            EntityType::Purchase,
            purchase.id,
            format!(
                "Atualizou o pedido {}",
                purchase.order_number.as_deref().unwrap_or_default()
            ),
            None,
        )
        .await;

    Ok(Json(ApiResponse::ok(purchase)))
}

/// Cancel a purchase; the reason is optional
pub async fn cancel_purchase(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelPurchaseInput>>,
) -> AppResult<Json<ApiResponse<Purchase>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let purchase = PurchaseService::new(state.db.clone()).cancel(id, input).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Cancelled,
            EntityType::Purchase,
            purchase.id,
            format!(
                "Cancelou o pedido {}",
                purchase.order_number.as_deref().unwrap_or_default()
            ),
            Some(json!({ "reason": purchase.cancel_reason })),
        )
        .await;

    Ok(Json(
        ApiResponse::ok(purchase).with_message("Pedido cancelado com sucesso"),
    ))
}

// Receivings

pub async fn list_receivings(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<ReceivingQuery>,
) -> AppResult<Json<ApiResponse<Vec<Receiving>>>> {
    let receivings = receiving_service(&state).list(query).await?;
    Ok(Json(ApiResponse::list(receivings)))
}

pub async fn get_receiving(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Receiving>>> {
    let receiving = receiving_service(&state).get(id).await?;
    Ok(Json(ApiResponse::ok(receiving)))
}

/// Attach the invoice photo (multipart field `photo` or `file`)
pub async fn upload_receiving_photo(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Receiving>>> {
    let file = read_upload(&mut multipart, &["photo", "file"]).await?;
    let receiving = receiving_service(&state)
        .upload_photo(id, &file.content_type, file.data)
        .await?;

    Ok(Json(
        ApiResponse::ok(receiving).with_message("Foto da nota fiscal enviada"),
    ))
}

pub async fn update_receiving_checklist_item(
    State(state): State<AppState>,
    staff: Staff,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(update): Json<ChecklistUpdate>,
) -> AppResult<Json<ApiResponse<Receiving>>> {
    let receiving = receiving_service(&state)
        .update_checklist_item(id, index, update, staff.id)
        .await?;
    Ok(Json(ApiResponse::ok(receiving)))
}

/// Close a receiving and move what arrived into stock
pub async fn complete_receiving(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    body: Option<Json<CompleteReceivingInput>>,
) -> AppResult<Json<ApiResponse<CompletedReceiving>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let completed = receiving_service(&state).complete(id, input, staff.id).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Completed,
            EntityType::Receiving,
            id,
            format!(
                "Concluiu o recebimento de {}",
                completed.receiving.supplier_name
            ),
            Some(json!({
                "stock_updates": completed.stock_updates,
                "purchase_status": completed.purchase_status,
                "received_total_value": completed.receiving.received_total_value,
            })),
        )
        .await;

    Ok(Json(
        ApiResponse::ok(completed).with_message("Recebimento concluído com sucesso"),
    ))
}

// Inventory counts

pub async fn list_inventory_counts(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<CountQuery>,
) -> AppResult<Json<ApiResponse<Vec<InventoryCount>>>> {
    let counts = CountService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(counts)))
}

pub async fn get_inventory_count(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryCount>>> {
    let count = CountService::new(state.db).get(id).await?;
    Ok(Json(ApiResponse::ok(count)))
}

pub async fn start_inventory_count(
    State(state): State<AppState>,
    staff: Staff,
    Json(input): Json<StartCountInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<InventoryCount>>)> {
    let count = CountService::new(state.db.clone()).start(input, staff.id).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Created,
            EntityType::InventoryCount,
            count.id,
            format!("Iniciou a contagem de {}", count.storage_center),
            None,
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(count))))
}

pub async fn update_inventory_count(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCountInput>,
) -> AppResult<Json<ApiResponse<InventoryCount>>> {
    let count = CountService::new(state.db).update(id, input).await?;
    Ok(Json(ApiResponse::ok(count)))
}

/// Apply the counted quantities to stock
pub async fn complete_inventory_count(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CompletedCount>>> {
    let completed = CountService::new(state.db.clone()).complete(id, staff.id).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Completed,
            EntityType::InventoryCount,
            id,
            format!(
                "Concluiu a contagem de {}",
                completed.count.storage_center
            ),
            Some(json!({ "adjustments": completed.adjustments })),
        )
        .await;

    Ok(Json(
        ApiResponse::ok(completed).with_message("Contagem concluída com sucesso"),
    ))
}

pub async fn cancel_inventory_count(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelCountInput>>,
) -> AppResult<Json<ApiResponse<InventoryCount>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let count = CountService::new(state.db.clone()).cancel(id, input).await?;

    ActivityService::new(state.db.clone())
        .record(
            &staff.actor(),
            ActivityAction::Cancelled,
            EntityType::InventoryCount,
            id,
            format!("Cancelou a contagem de {}", count.storage_center),
            Some(json!({ "reason": count.cancel_reason })),
        )
        .await;

    Ok(Json(ApiResponse::ok(count)))
}

// Stock movements

pub async fn list_stock_movements(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<ApiResponse<Vec<StockMovement>>>> {
    let movements = InventoryService::new(state.db).list_movements(query).await?;
    Ok(Json(ApiResponse::list(movements)))
}
