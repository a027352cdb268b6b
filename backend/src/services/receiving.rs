//! Goods receiving
//!
//! A receiving is the dock-side checklist of a purchase. Lines are checked
//! one at a time; completion moves the received quantities into stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    apply_checklist_update, invoice_photo_key, plan_completion, receiving_totals,
    validate_invoice_photo, ChecklistItem, ChecklistUpdate, NewStockMovement, PurchaseStatus,
    ReceivingStatus,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::ObjectStoreClient;
use crate::services::inventory::{append_movement, lock_stock};

/// Receiving service
#[derive(Clone)]
pub struct ReceivingService {
    db: PgPool,
    storage: ObjectStoreClient,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Receiving {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: String,
    pub order_number: Option<String>,
    pub receiving_date: Option<NaiveDate>,
    pub status: String,
    pub checklist: Json<Vec<ChecklistItem>>,
    pub ordered_total_value: Decimal,
    pub received_total_value: Decimal,
    pub adjustment_value: Decimal,
    pub invoice_photo_url: Option<String>,
    pub invoice_photo_uploaded_at: Option<DateTime<Utc>>,
    pub general_notes: Option<String>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receiving {
    pub fn status(&self) -> AppResult<ReceivingStatus> {
        Ok(self.status.parse()?)
    }
}

const RECEIVING_COLUMNS: &str = "id, purchase_id, supplier_id, supplier_name, order_number, \
     receiving_date, status, checklist, ordered_total_value, received_total_value, \
     adjustment_value, invoice_photo_url, invoice_photo_uploaded_at, general_notes, \
     completed_by, completed_at, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct ReceivingQuery {
    pub purchase_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub status: Option<ReceivingStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteReceivingInput {
    pub general_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompletedReceiving {
    pub receiving: Receiving,
    pub stock_updates: usize,
    pub purchase_status: Option<PurchaseStatus>,
}

impl ReceivingService {
    pub fn new(db: PgPool, storage: ObjectStoreClient) -> Self {
        Self { db, storage }
    }

    pub async fn list(&self, query: ReceivingQuery) -> AppResult<Vec<Receiving>> {
        let receivings = sqlx::query_as::<_, Receiving>(&format!(
            r#"
            SELECT {}
            FROM receivings
            WHERE ($1::UUID IS NULL OR purchase_id = $1)
              AND ($2::UUID IS NULL OR supplier_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
            RECEIVING_COLUMNS
        ))
        .bind(query.purchase_id)
        .bind(query.supplier_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(receivings)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Receiving> {
        sqlx::query_as::<_, Receiving>(&format!(
            "SELECT {} FROM receivings WHERE id = $1",
            RECEIVING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recebimento não encontrado".to_string()))
    }

    /// Store the invoice photo and attach its URL
    pub async fn upload_photo(
        &self,
        id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Receiving> {
        let receiving = self.get(id).await?;
        if receiving.status()?.is_closed() {
            return Err(AppError::InvalidStateTransition(
                "Recebimento já finalizado não pode ser alterado".to_string(),
            ));
        }

        let ext = validate_invoice_photo(content_type, bytes.len())?;
        let uploaded_at = Utc::now();
        let key = invoice_photo_key(id, uploaded_at, ext);
        let url = self.storage.put_object(&key, content_type, bytes).await?;

        let receiving = sqlx::query_as::<_, Receiving>(&format!(
            r#"
            UPDATE receivings
            SET invoice_photo_url = $1, invoice_photo_uploaded_at = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            RECEIVING_COLUMNS
        ))
        .bind(&url)
        .bind(uploaded_at)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Invoice photo stored for receiving {}", id);
        Ok(receiving)
    }

    /// Record the check of one checklist line and refresh the totals
    pub async fn update_checklist_item(
        &self,
        id: Uuid,
        index: usize,
        update: ChecklistUpdate,
        user_id: Uuid,
    ) -> AppResult<Receiving> {
        let mut tx = self.db.begin().await?;

        let receiving = sqlx::query_as::<_, Receiving>(&format!(
            "SELECT {} FROM receivings WHERE id = $1 FOR UPDATE",
            RECEIVING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Recebimento não encontrado".to_string()))?;

        let status = receiving.status()?;
        let mut checklist = receiving.checklist.0;
        apply_checklist_update(status, &mut checklist, index, update, user_id, Utc::now())?;
        let totals = receiving_totals(&checklist, receiving.ordered_total_value)?;

        let receiving = sqlx::query_as::<_, Receiving>(&format!(
            r#"
            UPDATE receivings
            SET checklist = $1, received_total_value = $2, adjustment_value = $3,
                status = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            RECEIVING_COLUMNS
        ))
        .bind(Json(&checklist))
        .bind(totals.received_total_value)
        .bind(totals.adjustment_value)
        .bind(ReceivingStatus::InProgress.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(receiving)
    }

    /// Close the receiving, move received quantities into stock and update
    /// the purchase status
    pub async fn complete(
        &self,
        id: Uuid,
        input: CompleteReceivingInput,
        user_id: Uuid,
    ) -> AppResult<CompletedReceiving> {
        let mut tx = self.db.begin().await?;

        let receiving = sqlx::query_as::<_, Receiving>(&format!(
            "SELECT {} FROM receivings WHERE id = $1 FOR UPDATE",
            RECEIVING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Recebimento não encontrado".to_string()))?;

        let plan = plan_completion(
            receiving.status()?,
            receiving.invoice_photo_url.is_some(),
            &receiving.checklist,
        )?;

        for increment in &plan.increments {
            let stock = lock_stock(&mut *tx, increment.ingredient_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Ingrediente {} não encontrado",
                        increment.ingredient_name
                    ))
                })?;

            let movement =
                NewStockMovement::receiving(increment, stock.current_stock, id, user_id)?;

            sqlx::query(
                r#"
                UPDATE ingredients
                SET current_stock = $1, last_order_date = NOW(), last_order_supplier = $2,
                    last_stock_update = NOW(), expiry_date = COALESCE($3, expiry_date),
                    updated_at = NOW()
                WHERE id = $4
                "#,
            )
            .bind(movement.new_stock)
            .bind(&receiving.supplier_name)
            .bind(increment.expiry_date)
            .bind(increment.ingredient_id)
            .execute(&mut *tx)
            .await?;

            append_movement(&mut *tx, &movement).await?;
        }

        let completed = sqlx::query_as::<_, Receiving>(&format!(
            r#"
            UPDATE receivings
            SET status = $1, completed_by = $2, completed_at = NOW(), general_notes = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            RECEIVING_COLUMNS
        ))
        .bind(ReceivingStatus::Completed.as_str())
        .bind(user_id)
        .bind(&input.general_notes)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(status) = plan.purchase_status {
            sqlx::query("UPDATE purchases SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(receiving.purchase_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Receiving {} completed: {} stock updates",
            id,
            plan.increments.len()
        );

        Ok(CompletedReceiving {
            receiving: completed,
            stock_updates: plan.increments.len(),
            purchase_status: plan.purchase_status,
        })
    }
}
