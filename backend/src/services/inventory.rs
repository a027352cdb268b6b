//! Stock levels and the stock movement ledger
//!
//! Every write to `ingredients.current_stock` goes through a transaction that
//! also appends a `stock_movements` row via [`append_movement`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    classify_stock, clamp_limit, reorder_date, stock_value, IngredientCategory, MovementType,
    NewStockMovement, ReferenceType, StockStatus, StockSummary, UNASSIGNED_STORAGE_CENTER,
    UNKNOWN_SUPPLIER_NAME,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MOVEMENTS_DEFAULT_LIMIT: i64 = 50;
const MOVEMENTS_MAX_LIMIT: i64 = 500;

/// Stock service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// An ingredient row joined with its supplier
#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: Uuid,
    name: String,
    category: String,
    unit: String,
    supplier_id: Option<Uuid>,
    supplier_name: Option<String>,
    delivery_time: Option<i32>,
    gross_qty: Decimal,
    price: Decimal,
    min_stock: Decimal,
    max_stock: Decimal,
    current_stock: Decimal,
    avg_daily_consumption: Option<Decimal>,
    storage_center: Option<String>,
    expiry_date: Option<NaiveDate>,
    last_order_date: Option<DateTime<Utc>>,
    last_stock_update: Option<DateTime<Utc>>,
}

/// Stock position of one ingredient with its derived values
#[derive(Debug, Clone, Serialize)]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: String,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    pub avg_daily_consumption: Option<Decimal>,
    pub storage_center: String,
    pub expiry_date: Option<NaiveDate>,
    pub last_order_date: Option<DateTime<Utc>>,
    pub last_stock_update: Option<DateTime<Utc>>,
    pub stock_status: StockStatus,
    pub stock_value: Decimal,
    pub recommended_reorder_date: Option<NaiveDate>,
}

/// Current stock, grouped by storage center
#[derive(Debug, Serialize)]
pub struct StockOverview {
    pub by_storage_center: BTreeMap<String, Vec<StockItem>>,
    pub all_ingredients: Vec<StockItem>,
    pub summary: StockSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub storage_center: Option<String>,
    pub category: Option<IngredientCategory>,
    pub status: Option<StockStatus>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub movement_type: String,
    pub quantity: Decimal,
    pub unit: String,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub storage_center: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

const MOVEMENT_COLUMNS: &str = "id, ingredient_id, ingredient_name, movement_type, quantity, unit, \
     previous_stock, new_stock, reference_type, reference_id, storage_center, reason, notes, \
     created_by, created_at";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub ingredient_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub new_quantity: Decimal,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentResult {
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub difference: Decimal,
    pub movement_id: Uuid,
}

/// Append a movement on the caller's transaction
pub(crate) async fn append_movement(
    conn: &mut PgConnection,
    movement: &NewStockMovement,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO stock_movements (ingredient_id, ingredient_name, movement_type, quantity, unit,
                                     previous_stock, new_stock, reference_type, reference_id,
                                     storage_center, reason, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(movement.ingredient_id)
    .bind(&movement.ingredient_name)
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(&movement.unit)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(movement.reference_type.as_str())
    .bind(movement.reference_id)
    .bind(&movement.storage_center)
    .bind(&movement.reason)
    .bind(&movement.notes)
    .bind(movement.created_by)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

#[derive(sqlx::FromRow)]
pub(crate) struct LockedStock {
    pub name: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub storage_center: Option<String>,
}

/// Read an ingredient's stock, locking the row for the rest of the transaction
pub(crate) async fn lock_stock(conn: &mut PgConnection, ingredient_id: Uuid) -> AppResult<Option<LockedStock>> {
    let row = sqlx::query_as::<_, LockedStock>(
        "SELECT name, unit, current_stock, storage_center FROM ingredients WHERE id = $1 FOR UPDATE",
    )
    .bind(ingredient_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

impl StockItem {
    fn from_row(row: StockRow, today: NaiveDate) -> Self {
        let max = (row.max_stock > Decimal::ZERO).then_some(row.max_stock);
        Self {
            stock_status: classify_stock(row.current_stock, row.min_stock, max),
            stock_value: stock_value(row.current_stock, row.price, row.gross_qty),
            recommended_reorder_date: reorder_date(
                today,
                row.current_stock,
                row.min_stock,
                row.avg_daily_consumption,
                row.delivery_time,
            ),
            id: row.id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            supplier_id: row.supplier_id,
            supplier_name: row
                .supplier_name
                .unwrap_or_else(|| UNKNOWN_SUPPLIER_NAME.to_string()),
            current_stock: row.current_stock,
            min_stock: row.min_stock,
            max_stock: row.max_stock,
            avg_daily_consumption: row.avg_daily_consumption,
            storage_center: row
                .storage_center
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNASSIGNED_STORAGE_CENTER.to_string()),
            expiry_date: row.expiry_date,
            last_order_date: row.last_order_date,
            last_stock_update: row.last_stock_update,
        }
    }
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active ingredients with status, value and reorder date
    pub async fn current_stock(&self, query: StockQuery) -> AppResult<StockOverview> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT i.id, i.name, i.category, i.unit, i.supplier_id, s.name AS supplier_name,
                   s.delivery_time, i.gross_qty, i.price, i.min_stock, i.max_stock,
                   i.current_stock, i.avg_daily_consumption, i.storage_center, i.expiry_date,
                   i.last_order_date, i.last_stock_update
            FROM ingredients i
            LEFT JOIN suppliers s ON s.id = i.supplier_id
            WHERE i.status = 'active'
              AND ($1::TEXT IS NULL OR i.category = $1)
              AND ($2::UUID IS NULL OR i.supplier_id = $2)
            ORDER BY i.name ASC
            "#,
        )
        .bind(query.category.map(|c| c.as_str()))
        .bind(query.supplier_id)
        .fetch_all(&self.db)
        .await?;

        let today = Utc::now().date_naive();
        let items: Vec<StockItem> = rows
            .into_iter()
            .map(|row| StockItem::from_row(row, today))
            .filter(|item| {
                query
                    .storage_center
                    .as_deref()
                    .map_or(true, |center| item.storage_center == center)
            })
            .filter(|item| query.status.map_or(true, |status| item.stock_status == status))
            .collect();

        let summary = StockSummary::tally(items.iter().map(|i| i.stock_status));
        let mut by_storage_center: BTreeMap<String, Vec<StockItem>> = BTreeMap::new();
        for item in &items {
            by_storage_center
                .entry(item.storage_center.clone())
                .or_default()
                .push(item.clone());
        }

        Ok(StockOverview {
            by_storage_center,
            all_ingredients: items,
            summary,
        })
    }

    /// Movements of one ingredient, newest first
    pub async fn ingredient_movements(
        &self,
        ingredient_id: Uuid,
        page: PageQuery,
    ) -> AppResult<Vec<StockMovement>> {
        let limit = clamp_limit(page.limit, MOVEMENTS_DEFAULT_LIMIT, MOVEMENTS_MAX_LIMIT);
        let offset = page.offset.unwrap_or(0).max(0);

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE ingredient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(ingredient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Ledger across all ingredients
    pub async fn list_movements(&self, query: MovementQuery) -> AppResult<Vec<StockMovement>> {
        let limit = clamp_limit(query.limit, MOVEMENTS_DEFAULT_LIMIT, MOVEMENTS_MAX_LIMIT);

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE ($1::UUID IS NULL OR ingredient_id = $1)
              AND ($2::TEXT IS NULL OR movement_type = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(query.ingredient_id)
        .bind(query.movement_type.map(|t| t.as_str()))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Set an absolute stock level and record the difference
    pub async fn adjust(
        &self,
        ingredient_id: Uuid,
        input: AdjustStockInput,
        user_id: Uuid,
    ) -> AppResult<AdjustmentResult> {
        if input.new_quantity < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Quantidade não pode ser negativa".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let stock = lock_stock(&mut *tx, ingredient_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ingrediente não encontrado".to_string()))?;

        sqlx::query(
            "UPDATE ingredients SET current_stock = $1, last_stock_update = NOW(), updated_at = NOW() WHERE id = $2",
        )
        .bind(input.new_quantity)
        .bind(ingredient_id)
        .execute(&mut *tx)
        .await?;

        let movement = NewStockMovement::adjustment(
            ingredient_id,
            &stock.name,
            &stock.unit,
            stock.current_stock,
            input.new_quantity,
            ReferenceType::Manual,
            None,
            Some(user_id),
        )
        .with_storage_center(stock.storage_center)
        .with_reason(input.reason)
        .with_notes(input.notes);
        let movement_id = append_movement(&mut *tx, &movement).await?;

        tx.commit().await?;

        tracing::info!(
            "Stock of {} adjusted {} -> {}",
            ingredient_id,
            movement.previous_stock,
            movement.new_stock
        );

        Ok(AdjustmentResult {
            previous_stock: movement.previous_stock,
            new_stock: movement.new_stock,
            difference: movement.quantity,
            movement_id,
        })
    }
}
