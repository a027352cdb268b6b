//! Purchase orders
//!
//! A purchase is always created together with its receiving, in one
//! transaction, whether it comes from a finalized draft or a direct order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    build_checklist, clamp_limit, ensure_purchase_cancellable, ensure_purchase_editable,
    next_order_number, price_order_lines, ChecklistItem, OrderLine, PurchaseItem, PurchaseStatus,
    ReceivingStatus, DEFAULT_CANCEL_REASON,
};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const PURCHASES_DEFAULT_LIMIT: i64 = 50;
const PURCHASES_MAX_LIMIT: i64 = 200;

/// Purchase service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub order_number: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: String,
    pub order_date: NaiveDate,
    pub expected_delivery: Option<NaiveDate>,
    pub items: Json<Vec<PurchaseItem>>,
    pub total_value: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub receiving_id: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn status(&self) -> AppResult<PurchaseStatus> {
        Ok(self.status.parse()?)
    }
}

pub(crate) const PURCHASE_COLUMNS: &str = "id, order_number, supplier_id, supplier_name, order_date, \
     expected_delivery, items, total_value, status, notes, receiving_id, cancel_reason, \
     cancelled_at, created_by, created_at, updated_at";

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseInput {
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePurchaseInput {
    pub notes: Option<String>,
    pub expected_delivery: Option<NaiveDate>,
    pub items: Option<Vec<OrderLine>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelPurchaseInput {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseQuery {
    pub status: Option<PurchaseStatus>,
    pub supplier_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Everything needed to write a purchase and its receiving
pub(crate) struct NewPurchase<'a> {
    pub supplier_id: Uuid,
    pub supplier_name: &'a str,
    pub order_date: NaiveDate,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    pub items: &'a [PurchaseItem],
    pub total_value: Decimal,
    pub checklist: &'a [ChecklistItem],
    pub created_by: Uuid,
}

/// Issue the next order number of the year, on the caller's transaction
/// Receiving statuses that still follow changes made to their purchase
fn open_receiving_statuses() -> Vec<&'static str> {
    ReceivingStatus::ALL
        .iter()
        .filter(|status| !status.is_closed())
        .map(|status| status.as_str())
        .collect()
}

/// Load a purchase and hold its row lock until the transaction ends
async fn lock_purchase(conn: &mut PgConnection, id: Uuid) -> AppResult<Purchase> {
    sqlx::query_as::<_, Purchase>(&format!(
        "SELECT {} FROM purchases WHERE id = $1 FOR UPDATE",
        PURCHASE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))
}

async fn issue_order_number(conn: &mut PgConnection, year: i32) -> AppResult<String> {
    let last = sqlx::query_scalar::<_, String>(
        r#"
        SELECT order_number
        FROM purchases
        WHERE order_number LIKE $1
        ORDER BY LENGTH(order_number) DESC, order_number DESC
        LIMIT 1
        "#,
    )
    .bind(format!("PED-{}-%", year))
    .fetch_optional(conn)
    .await?;

    Ok(next_order_number(year, last.as_deref()))
}

/// Insert the purchase, its receiving, and link them
pub(crate) async fn insert_purchase_with_receiving(
    conn: &mut PgConnection,
    new: NewPurchase<'_>,
) -> AppResult<(Purchase, Uuid)> {
    // Serializes order numbering between concurrent writers
    sqlx::query("LOCK TABLE purchases IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    let order_number = issue_order_number(&mut *conn, new.order_date.year()).await?;

    let purchase_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO purchases (order_number, supplier_id, supplier_name, order_date, expected_delivery,
                               items, total_value, status, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&order_number)
    .bind(new.supplier_id)
    .bind(new.supplier_name)
    .bind(new.order_date)
    .bind(new.expected_delivery)
    .bind(Json(new.items))
    .bind(new.total_value)
    .bind(PurchaseStatus::Pending.as_str())
    .bind(new.notes)
    .bind(new.created_by)
    .fetch_one(&mut *conn)
    .await?;

    let receiving_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO receivings (purchase_id, supplier_id, supplier_name, order_number, receiving_date,
                                status, checklist, ordered_total_value)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(purchase_id)
    .bind(new.supplier_id)
    .bind(new.supplier_name)
    .bind(&order_number)
    .bind(new.expected_delivery)
    .bind(ReceivingStatus::AwaitingDelivery.as_str())
    .bind(Json(new.checklist))
    .bind(new.total_value)
    .fetch_one(&mut *conn)
    .await?;

    let purchase = sqlx::query_as::<_, Purchase>(&format!(
        "UPDATE purchases SET receiving_id = $1 WHERE id = $2 RETURNING {}",
        PURCHASE_COLUMNS
    ))
    .bind(receiving_id)
    .bind(purchase_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((purchase, receiving_id))
}

#[derive(sqlx::FromRow)]
struct IngredientName {
    id: Uuid,
    name: String,
}

impl PurchaseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: PurchaseQuery) -> AppResult<Vec<Purchase>> {
        let limit = clamp_limit(query.limit, PURCHASES_DEFAULT_LIMIT, PURCHASES_MAX_LIMIT);

        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {}
            FROM purchases
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR supplier_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.supplier_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(purchases)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Purchase> {
        sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {} FROM purchases WHERE id = $1",
            PURCHASE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido não encontrado".to_string()))
    }

    /// Check every referenced ingredient exists and take its current name
    async fn resolve_ingredients(&self, lines: &mut [OrderLine]) -> AppResult<()> {
        let ids: Vec<Uuid> = lines
            .iter()
            .map(|l| l.ingredient_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let names: HashMap<Uuid, String> = sqlx::query_as::<_, IngredientName>(
            "SELECT id, name FROM ingredients WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();

        for line in lines.iter_mut() {
            let name = names.get(&line.ingredient_id).ok_or_else(|| {
                AppError::NotFound(format!("Ingrediente {} não encontrado", line.ingredient_id))
            })?;
            line.ingredient_name = name.clone();
        }
        Ok(())
    }

    /// Create a purchase and its receiving atomically
    pub async fn create(&self, input: CreatePurchaseInput, created_by: Uuid) -> AppResult<Purchase> {
        let supplier_id = input.supplier_id.ok_or_else(|| {
            AppError::ValidationError("Fornecedor é obrigatório".to_string())
        })?;
        let mut lines = input.items;
        if lines.is_empty() {
            return Err(AppError::ValidationError("Adicione pelo menos um item".to_string()));
        }

        let supplier_name = sqlx::query_scalar::<_, String>("SELECT name FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Fornecedor não encontrado".to_string()))?;

        self.resolve_ingredients(&mut lines).await?;
        let (items, total_value) = price_order_lines(&lines)?;
        let checklist = build_checklist(&items);

        let mut tx = self.db.begin().await?;
        let (purchase, receiving_id) = insert_purchase_with_receiving(
            &mut *tx,
            NewPurchase {
                supplier_id,
                supplier_name: &supplier_name,
                order_date: input.order_date.unwrap_or_else(|| Utc::now().date_naive()),
                expected_delivery: input.expected_delivery,
                notes: input.notes.as_deref(),
                items: &items,
                total_value,
                checklist: &checklist,
                created_by,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            "Purchase {} created with receiving {}",
            purchase.order_number.as_deref().unwrap_or_default(),
            receiving_id
        );
        Ok(purchase)
    }

    /// Edit notes, delivery date or lines of a pending purchase
    pub async fn update(&self, id: Uuid, input: UpdatePurchaseInput) -> AppResult<Purchase> {
        let mut tx = self.db.begin().await?;

        let existing = lock_purchase(&mut *tx, id).await?;
        ensure_purchase_editable(existing.status()?)?;

        let (items, total_value) = match input.items {
            Some(mut lines) => {
                self.resolve_ingredients(&mut lines).await?;
                let (items, total) = price_order_lines(&lines)?;

                // The receiving mirrors the purchase lines until the delivery starts
                let rebuilt = sqlx::query(
                    r#"
                    UPDATE receivings
                    SET checklist = $1, ordered_total_value = $2, updated_at = NOW()
                    WHERE purchase_id = $3 AND status = $4
                    "#,
                )
                .bind(Json(build_checklist(&items)))
                .bind(total)
                .bind(id)
                .bind(ReceivingStatus::AwaitingDelivery.as_str())
                .execute(&mut *tx)
                .await?;
                if rebuilt.rows_affected() == 0 && existing.receiving_id.is_some() {
                    return Err(AppError::InvalidStateTransition(
                        "Recebimento já iniciado, itens não podem ser alterados".to_string(),
                    ));
                }
                (items, total)
            }
            None => (existing.items.0, existing.total_value),
        };

        if let Some(expected) = input.expected_delivery {
            sqlx::query(
                r#"
                UPDATE receivings
                SET receiving_date = $1, updated_at = NOW()
                WHERE purchase_id = $2 AND status = ANY($3)
                "#,
            )
            .bind(expected)
            .bind(id)
            .bind(open_receiving_statuses())
            .execute(&mut *tx)
            .await?;
        }

        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            UPDATE purchases
            SET notes = $1, expected_delivery = $2, items = $3, total_value = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(input.notes.or(existing.notes))
        .bind(input.expected_delivery.or(existing.expected_delivery))
        .bind(Json(&items))
        .bind(total_value)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(purchase)
    }

    /// Cancel the purchase and, unless already completed, its receiving
    pub async fn cancel(&self, id: Uuid, input: CancelPurchaseInput) -> AppResult<Purchase> {
        let reason = input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

        let mut tx = self.db.begin().await?;

        let existing = lock_purchase(&mut *tx, id).await?;
        ensure_purchase_cancellable(existing.status()?)?;

        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            UPDATE purchases
            SET status = $1, cancel_reason = $2, cancelled_at = NOW(), updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(PurchaseStatus::Cancelled.as_str())
        .bind(&reason)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE receivings
            SET status = $1, updated_at = NOW()
            WHERE purchase_id = $2 AND status != $3
            "#,
        )
        .bind(ReceivingStatus::Cancelled.as_str())
        .bind(id)
        .bind(ReceivingStatus::Completed.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Purchase {} cancelled: {}", id, reason);
        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_receivings_are_not_rescheduled() {
        let open = open_receiving_statuses();
        assert_eq!(open, vec!["awaiting_delivery", "in_progress"]);
        assert!(!open.contains(&ReceivingStatus::Completed.as_str()));
        assert!(!open.contains(&ReceivingStatus::Cancelled.as_str()));
    }
}
