//! Ingredient registry

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{require_text, IngredientCategory, IngredientQuantities};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Ingredient service
#[derive(Clone)]
pub struct IngredientService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub supplier_id: Option<Uuid>,
    pub gross_qty: Decimal,
    pub net_qty: Decimal,
    pub yield_factor: Decimal,
    pub price: Decimal,
    pub purchase_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    pub current_stock: Decimal,
    pub avg_daily_consumption: Option<Decimal>,
    pub storage_center: Option<String>,
    pub last_order_date: Option<DateTime<Utc>>,
    pub last_order_supplier: Option<String>,
    pub last_stock_update: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

pub(crate) const INGREDIENT_COLUMNS: &str = "id, name, category, unit, supplier_id, gross_qty, net_qty, \
     yield_factor, price, purchase_date, expiry_date, min_stock, max_stock, current_stock, \
     avg_daily_consumption, storage_center, last_order_date, last_order_supplier, \
     last_stock_update, status, created_at, updated_at, deleted_at";

/// Lookup by id. Soft-deleted rows stay reachable so history still resolves.
fn select_by_id() -> String {
    format!("SELECT {} FROM ingredients WHERE id = $1", INGREDIENT_COLUMNS)
}

#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: Option<String>,
    pub category: Option<IngredientCategory>,
    pub unit: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub gross_qty: Option<Decimal>,
    pub net_qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub current_stock: Option<Decimal>,
    pub avg_daily_consumption: Option<Decimal>,
    pub storage_center: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub category: Option<IngredientCategory>,
    pub unit: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub gross_qty: Option<Decimal>,
    pub net_qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub avg_daily_consumption: Option<Decimal>,
    pub storage_center: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    pub category: Option<IngredientCategory>,
    pub search: Option<String>,
}

fn missing_fields() -> AppError {
    AppError::ValidationError("Campos obrigatórios não preenchidos".to_string())
}

impl IngredientService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active ingredients, optionally filtered by category and name
    pub async fn list(&self, query: IngredientQuery) -> AppResult<Vec<Ingredient>> {
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            SELECT {}
            FROM ingredients
            WHERE status = 'active'
              AND ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY name ASC
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(query.category.map(|c| c.as_str()))
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(ingredients)
    }

    /// Fetch by id, including soft-deleted rows
    pub async fn get(&self, id: Uuid) -> AppResult<Ingredient> {
        sqlx::query_as::<_, Ingredient>(&select_by_id())
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ingrediente não encontrado".to_string()))
    }

    async fn ensure_supplier_exists(&self, supplier_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .fetch_one(&self.db)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound("Fornecedor não encontrado".to_string()));
        }
        Ok(())
    }

    pub async fn create(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        let name = require_text(input.name.as_deref())?;
        let unit = require_text(input.unit.as_deref())?;
        let storage_center = require_text(input.storage_center.as_deref())?;
        let category = input.category.ok_or_else(missing_fields)?;
        let supplier_id = input.supplier_id.ok_or_else(missing_fields)?;
        let purchase_date = input.purchase_date.ok_or_else(missing_fields)?;

        let quantities = IngredientQuantities {
            gross_qty: input.gross_qty.ok_or_else(missing_fields)?,
            net_qty: input.net_qty.ok_or_else(missing_fields)?,
            price: input.price.ok_or_else(missing_fields)?,
            min_stock: input.min_stock.ok_or_else(missing_fields)?,
            max_stock: input.max_stock.ok_or_else(missing_fields)?,
        };
        quantities.validate()?;
        self.ensure_supplier_exists(supplier_id).await?;

        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            INSERT INTO ingredients (name, category, unit, supplier_id, gross_qty, net_qty, yield_factor,
                                     price, purchase_date, expiry_date, min_stock, max_stock,
                                     current_stock, avg_daily_consumption, storage_center)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(name)
        .bind(category.as_str())
        .bind(unit)
        .bind(supplier_id)
        .bind(quantities.gross_qty)
        .bind(quantities.net_qty)
        .bind(quantities.yield_factor())
        .bind(quantities.price)
        .bind(purchase_date)
        .bind(input.expiry_date)
        .bind(quantities.min_stock)
        .bind(quantities.max_stock)
        .bind(input.current_stock.unwrap_or(Decimal::ZERO).max(Decimal::ZERO))
        .bind(input.avg_daily_consumption)
        .bind(storage_center)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Ingredient {} created", ingredient.id);
        Ok(ingredient)
    }

    /// Merge the changes, re-validate, and recompute the yield factor
    pub async fn update(&self, id: Uuid, input: UpdateIngredientInput) -> AppResult<Ingredient> {
        let existing = self.get(id).await?;
        if existing.status == "deleted" {
            return Err(AppError::InvalidStateTransition(
                "Ingrediente removido não pode ser alterado".to_string(),
            ));
        }

        for field in [&input.name, &input.unit].into_iter().flatten() {
            require_text(Some(field))?;
        }
        if let Some(supplier_id) = input.supplier_id {
            self.ensure_supplier_exists(supplier_id).await?;
        }

        let quantities = IngredientQuantities {
            gross_qty: input.gross_qty.unwrap_or(existing.gross_qty),
            net_qty: input.net_qty.unwrap_or(existing.net_qty),
            price: input.price.unwrap_or(existing.price),
            min_stock: input.min_stock.unwrap_or(existing.min_stock),
            max_stock: input.max_stock.unwrap_or(existing.max_stock),
        };
        quantities.validate()?;

        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            UPDATE ingredients
            SET name = $1, category = $2, unit = $3, supplier_id = $4, gross_qty = $5,
                net_qty = $6, yield_factor = $7, price = $8, purchase_date = $9,
                expiry_date = $10, min_stock = $11, max_stock = $12,
                avg_daily_consumption = $13, storage_center = $14, updated_at = NOW()
            WHERE id = $15
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.category.map(|c| c.as_str().to_string()).unwrap_or(existing.category))
        .bind(input.unit.unwrap_or(existing.unit))
        .bind(input.supplier_id.or(existing.supplier_id))
        .bind(quantities.gross_qty)
        .bind(quantities.net_qty)
        .bind(quantities.yield_factor())
        .bind(quantities.price)
        .bind(input.purchase_date.unwrap_or(existing.purchase_date))
        .bind(input.expiry_date.or(existing.expiry_date))
        .bind(quantities.min_stock)
        .bind(quantities.max_stock)
        .bind(input.avg_daily_consumption.or(existing.avg_daily_consumption))
        .bind(input.storage_center.or(existing.storage_center))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(ingredient)
    }

    /// Soft delete
    pub async fn delete(&self, id: Uuid) -> AppResult<Ingredient> {
        let ingredient = self.get(id).await?;

        sqlx::query(
            "UPDATE ingredients SET status = 'deleted', deleted_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(ingredient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id_keeps_deleted_rows() {
        let sql = select_by_id();
        assert!(sql.ends_with("FROM ingredients WHERE id = $1"));
        assert!(!sql.contains("deleted_at IS NULL"));
    }
}
