//! Physical inventory counts

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    discrepancies, ensure_count_open, prepare_count_items, require_text, CountItem,
    CountItemInput, CountStatus, NewStockMovement, ReferenceType,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory::{append_movement, lock_stock};

/// Inventory count service
#[derive(Clone)]
pub struct CountService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryCount {
    pub id: Uuid,
    pub storage_center: String,
    pub count_date: NaiveDate,
    pub items: Json<Vec<CountItem>>,
    pub total_items: i32,
    pub total_differences: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryCount {
    pub fn status(&self) -> AppResult<CountStatus> {
        Ok(self.status.parse()?)
    }
}

const COUNT_COLUMNS: &str = "id, storage_center, count_date, items, total_items, total_differences, \
     status, notes, cancel_reason, created_by, approved_by, completed_at, created_at, updated_at";

#[derive(Debug, Deserialize)]
pub struct StartCountInput {
    pub storage_center: Option<String>,
    pub count_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<CountItemInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCountInput {
    pub items: Option<Vec<CountItemInput>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelCountInput {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub storage_center: Option<String>,
    pub status: Option<CountStatus>,
}

#[derive(Debug, Serialize)]
pub struct CompletedCount {
    pub count: InventoryCount,
    pub adjustments: usize,
}

impl CountService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: CountQuery) -> AppResult<Vec<InventoryCount>> {
        let counts = sqlx::query_as::<_, InventoryCount>(&format!(
            r#"
            SELECT {}
            FROM inventory_counts
            WHERE ($1::TEXT IS NULL OR storage_center = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY count_date DESC, created_at DESC
            "#,
            COUNT_COLUMNS
        ))
        .bind(query.storage_center.filter(|s| !s.is_empty()))
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<InventoryCount> {
        sqlx::query_as::<_, InventoryCount>(&format!(
            "SELECT {} FROM inventory_counts WHERE id = $1",
            COUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contagem não encontrada".to_string()))
    }

    pub async fn start(&self, input: StartCountInput, user_id: Uuid) -> AppResult<InventoryCount> {
        let storage_center = require_text(input.storage_center.as_deref())?;
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "Adicione pelo menos um item à contagem".to_string(),
            ));
        }
        let (items, total_differences) = prepare_count_items(input.items)?;

        let count = sqlx::query_as::<_, InventoryCount>(&format!(
            r#"
            INSERT INTO inventory_counts (storage_center, count_date, items, total_items,
                                          total_differences, status, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            COUNT_COLUMNS
        ))
        .bind(storage_center)
        .bind(input.count_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(Json(&items))
        .bind(items.len() as i32)
        .bind(total_differences)
        .bind(CountStatus::InProgress.as_str())
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Inventory count {} started for {}", count.id, count.storage_center);
        Ok(count)
    }

    pub async fn update(&self, id: Uuid, input: UpdateCountInput) -> AppResult<InventoryCount> {
        let existing = self.get(id).await?;
        ensure_count_open(existing.status()?)?;

        let (items, total_differences) = match input.items {
            Some(items) => prepare_count_items(items)?,
            None => (existing.items.0, existing.total_differences),
        };

        let count = sqlx::query_as::<_, InventoryCount>(&format!(
            r#"
            UPDATE inventory_counts
            SET items = $1, total_items = $2, total_differences = $3, notes = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            COUNT_COLUMNS
        ))
        .bind(Json(&items))
        .bind(items.len() as i32)
        .bind(total_differences)
        .bind(input.notes.or(existing.notes))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Overwrite stock with counted quantities wherever they differ
    pub async fn complete(&self, id: Uuid, user_id: Uuid) -> AppResult<CompletedCount> {
        let mut tx = self.db.begin().await?;

        let count = sqlx::query_as::<_, InventoryCount>(&format!(
            "SELECT {} FROM inventory_counts WHERE id = $1 FOR UPDATE",
            COUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Contagem não encontrada".to_string()))?;
        ensure_count_open(count.status()?)?;

        let mut adjustments = 0;
        for item in discrepancies(&count.items) {
            let Some(stock) = lock_stock(&mut *tx, item.ingredient_id).await? else {
                tracing::warn!(
                    "Count {}: ingredient {} no longer exists, skipping",
                    id,
                    item.ingredient_id
                );
                continue;
            };

            sqlx::query(
                "UPDATE ingredients SET current_stock = $1, last_stock_update = NOW(), updated_at = NOW() WHERE id = $2",
            )
            .bind(item.counted_qty)
            .bind(item.ingredient_id)
            .execute(&mut *tx)
            .await?;

            let movement = NewStockMovement::adjustment(
                item.ingredient_id,
                &stock.name,
                &stock.unit,
                stock.current_stock,
                item.counted_qty,
                ReferenceType::InventoryCount,
                Some(id),
                Some(user_id),
            )
            .with_storage_center(Some(count.storage_center.clone()));
            append_movement(&mut *tx, &movement).await?;
            adjustments += 1;
        }

        let completed = sqlx::query_as::<_, InventoryCount>(&format!(
            r#"
            UPDATE inventory_counts
            SET status = $1, approved_by = $2, completed_at = NOW(), updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            COUNT_COLUMNS
        ))
        .bind(CountStatus::Completed.as_str())
        .bind(user_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Inventory count {} completed: {} adjustments", id, adjustments);
        Ok(CompletedCount {
            count: completed,
            adjustments,
        })
    }

    pub async fn cancel(&self, id: Uuid, input: CancelCountInput) -> AppResult<InventoryCount> {
        let existing = self.get(id).await?;
        ensure_count_open(existing.status()?)?;

        let count = sqlx::query_as::<_, InventoryCount>(&format!(
            r#"
            UPDATE inventory_counts
            SET status = $1, cancel_reason = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            COUNT_COLUMNS
        ))
        .bind(CountStatus::Cancelled.as_str())
        .bind(input.reason.filter(|r| !r.trim().is_empty()))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}
