//! Recipe costing sheets ("fichas técnicas")

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    cost_recipe, require_text, validate_recipe_header, CostedLine, IngredientCostBasis,
    RecipeCosting, RecipeLineInput, UNCATEGORIZED_RECIPE,
};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Recipe service
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub portions: i32,
    pub ingredients: Json<Vec<CostedLine>>,
    pub ingredients_cost: Decimal,
    pub labor_cost: Decimal,
    pub equipment_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_portion: Decimal,
    pub suggested_price: Decimal,
    pub instructions: String,
    pub status: String,
    pub needs_completion: bool,
    pub created_from: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

const RECIPE_COLUMNS: &str = "id, name, category, portions, ingredients, ingredients_cost, labor_cost, \
     equipment_cost, total_cost, cost_per_portion, suggested_price, instructions, status, \
     needs_completion, created_from, created_at, updated_at, deleted_at";

#[derive(Debug, Deserialize)]
pub struct CreateRecipeInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub portions: Option<i32>,
    #[serde(default)]
    pub ingredients: Vec<RecipeLineInput>,
    pub labor_cost: Option<Decimal>,
    pub equipment_cost: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    pub instructions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub portions: Option<i32>,
    pub ingredients: Option<Vec<RecipeLineInput>>,
    pub labor_cost: Option<Decimal>,
    pub equipment_cost: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    pub instructions: Option<String>,
}

/// Stub recipe for a product that has no costing yet
#[derive(Debug, Deserialize)]
pub struct MinimalRecipeInput {
    pub name: Option<String>,
    /// Where the stub came from, e.g. the SKU that needed it
    pub created_from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CostBasisRow {
    id: Uuid,
    name: String,
    unit: String,
    price: Decimal,
    net_qty: Decimal,
}

impl RecipeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: RecipeQuery) -> AppResult<Vec<Recipe>> {
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {}
            FROM recipes
            WHERE status = 'active'
              AND ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY name ASC
            "#,
            RECIPE_COLUMNS
        ))
        .bind(query.category.filter(|c| !c.is_empty()))
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(recipes)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Recipe> {
        sqlx::query_as::<_, Recipe>(&format!("SELECT {} FROM recipes WHERE id = $1", RECIPE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ficha técnica não encontrada".to_string()))
    }

    /// Current prices for the ingredients a recipe references
    async fn cost_basis(&self, lines: &[RecipeLineInput]) -> AppResult<HashMap<Uuid, IngredientCostBasis>> {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.id).collect();
        let rows = sqlx::query_as::<_, CostBasisRow>(
            "SELECT id, name, unit, price, net_qty FROM ingredients WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    IngredientCostBasis {
                        name: row.name,
                        unit: row.unit,
                        price: row.price,
                        net_qty: row.net_qty,
                    },
                )
            })
            .collect())
    }

    async fn cost(
        &self,
        lines: &[RecipeLineInput],
        labor_cost: Decimal,
        equipment_cost: Decimal,
        portions: i32,
    ) -> AppResult<RecipeCosting> {
        let basis = self.cost_basis(lines).await?;
        Ok(cost_recipe(lines, &basis, labor_cost, equipment_cost, portions)?)
    }

    pub async fn create(&self, input: CreateRecipeInput) -> AppResult<Recipe> {
        let name = require_text(input.name.as_deref())?;
        let category = require_text(input.category.as_deref())?;
        let portions = input.portions.unwrap_or(0);
        let suggested_price = input.suggested_price.unwrap_or(Decimal::ZERO);
        validate_recipe_header(portions, suggested_price)?;
        if input.ingredients.is_empty() {
            return Err(AppError::ValidationError(
                "Adicione pelo menos um ingrediente".to_string(),
            ));
        }

        let costing = self
            .cost(
                &input.ingredients,
                input.labor_cost.unwrap_or(Decimal::ZERO),
                input.equipment_cost.unwrap_or(Decimal::ZERO),
                portions,
            )
            .await?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (name, category, portions, ingredients, ingredients_cost, labor_cost,
                                 equipment_cost, total_cost, cost_per_portion, suggested_price, instructions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(name)
        .bind(category)
        .bind(portions)
        .bind(Json(&costing.ingredients))
        .bind(costing.ingredients_cost)
        .bind(costing.labor_cost)
        .bind(costing.equipment_cost)
        .bind(costing.total_cost)
        .bind(costing.cost_per_portion)
        .bind(suggested_price)
        .bind(input.instructions.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Recipe {} created ({} lines)", recipe.id, costing.ingredients.len());
        Ok(recipe)
    }

    /// Name-only stub flagged for completion
    pub async fn create_minimal(&self, input: MinimalRecipeInput) -> AppResult<Recipe> {
        let name = require_text(input.name.as_deref())?;

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (name, category, needs_completion, created_from)
            VALUES ($1, $2, TRUE, $3)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(name)
        .bind(UNCATEGORIZED_RECIPE)
        .bind(&input.created_from)
        .fetch_one(&self.db)
        .await?;

        Ok(recipe)
    }

    /// Apply changes and recost against current ingredient prices
    pub async fn update(&self, id: Uuid, input: UpdateRecipeInput) -> AppResult<Recipe> {
        let existing = self.get(id).await?;
        if existing.status == "deleted" {
            return Err(AppError::InvalidStateTransition(
                "Ficha técnica removida não pode ser alterada".to_string(),
            ));
        }

        let portions = input.portions.unwrap_or(existing.portions);
        let suggested_price = input.suggested_price.unwrap_or(existing.suggested_price);
        if input.portions.is_some() || input.suggested_price.is_some() {
            validate_recipe_header(portions, suggested_price)?;
        }
        for field in [&input.name, &input.category].into_iter().flatten() {
            require_text(Some(field))?;
        }

        let lines = input.ingredients.unwrap_or_else(|| {
            existing
                .ingredients
                .iter()
                .map(|line| RecipeLineInput {
                    id: line.id,
                    quantity: line.quantity,
                })
                .collect()
        });
        let costing = self
            .cost(
                &lines,
                input.labor_cost.unwrap_or(existing.labor_cost),
                input.equipment_cost.unwrap_or(existing.equipment_cost),
                portions,
            )
            .await?;

        let complete = portions > 0 && suggested_price > Decimal::ZERO && !costing.ingredients.is_empty();

        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes
            SET name = $1, category = $2, portions = $3, ingredients = $4, ingredients_cost = $5,
                labor_cost = $6, equipment_cost = $7, total_cost = $8, cost_per_portion = $9,
                suggested_price = $10, instructions = $11, needs_completion = $12, updated_at = NOW()
            WHERE id = $13
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.category.unwrap_or(existing.category))
        .bind(portions)
        .bind(Json(&costing.ingredients))
        .bind(costing.ingredients_cost)
        .bind(costing.labor_cost)
        .bind(costing.equipment_cost)
        .bind(costing.total_cost)
        .bind(costing.cost_per_portion)
        .bind(suggested_price)
        .bind(input.instructions.unwrap_or(existing.instructions))
        .bind(!complete)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(recipe)
    }

    /// Soft delete
    pub async fn delete(&self, id: Uuid) -> AppResult<Recipe> {
        let recipe = self.get(id).await?;

        sqlx::query(
            "UPDATE recipes SET status = 'deleted', deleted_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(recipe)
    }
}
