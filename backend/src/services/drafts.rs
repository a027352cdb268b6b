//! Draft order carts
//!
//! Each user keeps at most one open cart per supplier. Finalizing turns the
//! cart into a purchase plus receiving and deletes it, all in one
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{draft_total, plan_finalize, DraftAction, OrderLine, SupplierMessage};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::purchasing::{insert_purchase_with_receiving, NewPurchase};

/// Draft order service
#[derive(Clone)]
pub struct DraftOrderService {
    db: PgPool,
    restaurant_name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DraftOrder {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub items: Json<Vec<OrderLine>>,
    pub total_value: Decimal,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DRAFT_COLUMNS: &str =
    "id, supplier_id, supplier_name, items, total_value, notes, status, created_by, created_at, updated_at";

/// One item added to the caller's cart for a supplier
#[derive(Debug, Deserialize)]
pub struct AddDraftItemInput {
    pub supplier_id: Uuid,
    pub supplier_name: Option<String>,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DraftChange {
    pub action: DraftAction,
    pub draft: DraftOrder,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDraftInput {
    pub items: Option<Vec<OrderLine>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeDraftInput {
    pub order_date: Option<NaiveDate>,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Replaces the stored lines when present
    pub items: Option<Vec<OrderLine>>,
}

#[derive(Debug, Serialize)]
pub struct FinalizedDraft {
    pub purchase_id: Uuid,
    pub receiving_id: Uuid,
    pub order_number: Option<String>,
    pub supplier_message: String,
}

impl DraftOrderService {
    pub fn new(db: PgPool, restaurant_name: impl Into<String>) -> Self {
        Self {
            db,
            restaurant_name: restaurant_name.into(),
        }
    }

    /// Open carts of a user, newest first
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<DraftOrder>> {
        let drafts = sqlx::query_as::<_, DraftOrder>(&format!(
            "SELECT {} FROM draft_orders WHERE created_by = $1 AND status = 'draft' ORDER BY created_at DESC",
            DRAFT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(drafts)
    }

    async fn get(&self, id: Uuid) -> AppResult<DraftOrder> {
        sqlx::query_as::<_, DraftOrder>(&format!(
            "SELECT {} FROM draft_orders WHERE id = $1",
            DRAFT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rascunho não encontrado".to_string()))
    }

    /// Add an item to the user's cart for the supplier, opening one if needed
    pub async fn add_item(&self, input: AddDraftItemInput, user_id: Uuid) -> AppResult<DraftChange> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Quantidade deve ser maior que zero".to_string(),
            ));
        }

        let line = OrderLine {
            ingredient_id: input.ingredient_id,
            ingredient_name: input.ingredient_name,
            quantity: input.quantity,
            unit: input.unit,
            unit_price: input.unit_price,
            notes: input.notes.filter(|n| !n.is_empty()),
        };

        let existing = sqlx::query_as::<_, DraftOrder>(&format!(
            r#"
            SELECT {}
            FROM draft_orders
            WHERE supplier_id = $1 AND created_by = $2 AND status = 'draft'
            LIMIT 1
            "#,
            DRAFT_COLUMNS
        ))
        .bind(input.supplier_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(draft) = existing {
            let mut items = draft.items.0;
            items.push(line);
            let draft = self.write_items(draft.id, &items, None).await?;
            return Ok(DraftChange {
                action: DraftAction::Updated,
                draft,
            });
        }

        let supplier_name = match input.supplier_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => sqlx::query_scalar::<_, String>("SELECT name FROM suppliers WHERE id = $1")
                .bind(input.supplier_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Fornecedor não encontrado".to_string()))?,
        };

        let items = vec![line];
        let total = draft_total(&items)?;
        let draft = sqlx::query_as::<_, DraftOrder>(&format!(
            r#"
            INSERT INTO draft_orders (supplier_id, supplier_name, items, total_value, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            DRAFT_COLUMNS
        ))
        .bind(input.supplier_id)
        .bind(&supplier_name)
        .bind(Json(&items))
        .bind(total)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(DraftChange {
            action: DraftAction::Created,
            draft,
        })
    }

    async fn write_items(&self, id: Uuid, items: &[OrderLine], notes: Option<String>) -> AppResult<DraftOrder> {
        let total = draft_total(items)?;
        let draft = sqlx::query_as::<_, DraftOrder>(&format!(
            r#"
            UPDATE draft_orders
            SET items = $1, total_value = $2, notes = COALESCE($3, notes), updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            DRAFT_COLUMNS
        ))
        .bind(Json(items))
        .bind(total)
        .bind(notes)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(draft)
    }

    pub async fn update(&self, id: Uuid, input: UpdateDraftInput) -> AppResult<DraftOrder> {
        let draft = self.get(id).await?;
        let items = input.items.unwrap_or(draft.items.0);
        self.write_items(id, &items, input.notes).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM draft_orders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Rascunho não encontrado".to_string()));
        }
        Ok(())
    }

    /// Convert the cart into a purchase and a receiving, then drop it
    pub async fn finalize(
        &self,
        id: Uuid,
        input: FinalizeDraftInput,
        user_id: Uuid,
    ) -> AppResult<FinalizedDraft> {
        let mut tx = self.db.begin().await?;

        let draft = sqlx::query_as::<_, DraftOrder>(&format!(
            "SELECT {} FROM draft_orders WHERE id = $1 FOR UPDATE",
            DRAFT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Rascunho não encontrado".to_string()))?;

        let lines = input.items.unwrap_or(draft.items.0);
        let plan = plan_finalize(&lines)?;

        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());
        let notes = input
            .notes
            .filter(|n| !n.trim().is_empty())
            .or(draft.notes);

        let (purchase, receiving_id) = insert_purchase_with_receiving(
            &mut *tx,
            NewPurchase {
                supplier_id: draft.supplier_id,
                supplier_name: &draft.supplier_name,
                order_date,
                expected_delivery: input.expected_delivery,
                notes: notes.as_deref(),
                items: &plan.items,
                total_value: plan.total_value,
                checklist: &plan.checklist,
                created_by: user_id,
            },
        )
        .await?;

        sqlx::query("DELETE FROM draft_orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let supplier_message = SupplierMessage {
            restaurant: &self.restaurant_name,
            order_date,
            supplier_name: &draft.supplier_name,
            order_number: purchase.order_number.as_deref().unwrap_or_default(),
            expected_delivery: input.expected_delivery,
            items: &plan.items,
            total_value: plan.total_value,
            notes: notes.as_deref(),
        }
        .render();

        tracing::info!("Draft {} finalized into purchase {}", id, purchase.id);

        Ok(FinalizedDraft {
            purchase_id: purchase.id,
            receiving_id,
            order_number: purchase.order_number,
            supplier_message,
        })
    }
}
