//! SKU to recipe mappings produced by the sales pipeline and reviewed by staff

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Confidence, MappingFacts, MappingStats};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Mapping service
#[derive(Clone)]
pub struct MappingService {
    db: PgPool,
}

/// A mapping enriched with its recipe's name and category
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductMapping {
    pub sku: String,
    pub product_name: Option<String>,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: Option<String>,
    pub recipe_category: Option<String>,
    pub confidence: Option<String>,
    pub needs_review: bool,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const MAPPING_SELECT: &str = r#"
    SELECT m.sku, m.product_name, m.recipe_id, r.name AS recipe_name,
           r.category AS recipe_category, m.confidence, m.needs_review,
           m.last_updated, m.created_at
    FROM product_mappings m
    LEFT JOIN recipes r ON r.id = m.recipe_id
"#;

#[derive(Debug, Default, Deserialize)]
pub struct MappingQuery {
    pub needs_review: Option<bool>,
    pub confidence: Option<Confidence>,
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMappingInput {
    /// `null` unlinks the SKU from any recipe
    pub recipe_id: Option<Uuid>,
    pub confidence: Confidence,
    pub needs_review: bool,
}

#[derive(sqlx::FromRow)]
struct MappingFactRow {
    confidence: Option<String>,
    needs_review: bool,
    has_recipe: bool,
}

impl MappingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: MappingQuery) -> AppResult<Vec<ProductMapping>> {
        let mappings = sqlx::query_as::<_, ProductMapping>(&format!(
            r#"
            {}
            WHERE ($1::BOOLEAN IS NULL OR m.needs_review = $1)
              AND ($2::TEXT IS NULL OR m.confidence = $2)
              AND ($3::TEXT IS NULL OR m.sku = $3)
            ORDER BY m.sku
            "#,
            MAPPING_SELECT
        ))
        .bind(query.needs_review)
        .bind(query.confidence.map(|c| c.as_str()))
        .bind(&query.sku)
        .fetch_all(&self.db)
        .await?;

        Ok(mappings)
    }

    pub async fn get_by_sku(&self, sku: &str) -> AppResult<ProductMapping> {
        sqlx::query_as::<_, ProductMapping>(&format!("{} WHERE m.sku = $1", MAPPING_SELECT))
            .bind(sku)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Mapeamento não encontrado".to_string()))
    }

    pub async fn stats(&self) -> AppResult<MappingStats> {
        let rows = sqlx::query_as::<_, MappingFactRow>(
            "SELECT confidence, needs_review, recipe_id IS NOT NULL AS has_recipe FROM product_mappings",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(MappingStats::tally(rows.into_iter().map(|r| MappingFacts {
            confidence: r.confidence.and_then(|c| c.parse().ok()),
            needs_review: r.needs_review,
            has_recipe: r.has_recipe,
        })))
    }

    /// Point a SKU at a recipe (or at none) and record the review outcome
    pub async fn update(&self, sku: &str, input: UpdateMappingInput) -> AppResult<ProductMapping> {
        if let Some(recipe_id) = input.recipe_id {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM recipes WHERE id = $1 AND deleted_at IS NULL)",
            )
            .bind(recipe_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Receita não encontrada".to_string()));
            }
        }

        let updated = sqlx::query(
            r#"
            UPDATE product_mappings
            SET recipe_id = $2, confidence = $3, needs_review = $4, last_updated = NOW()
            WHERE sku = $1
            "#,
        )
        .bind(sku)
        .bind(input.recipe_id)
        .bind(input.confidence.as_str())
        .bind(input.needs_review)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Mapeamento não encontrado".to_string()));
        }

        self.get_by_sku(sku).await
    }
}
