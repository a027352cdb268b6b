//! Supplier registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{ensure_supplier_unreferenced, require_text, validate_delivery_time};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_time: i32,
    pub payment_terms: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SUPPLIER_COLUMNS: &str =
    "id, name, contact, phone, email, delivery_time, payment_terms, notes, created_at, updated_at";

#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_time: Option<i32>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub delivery_time: Option<i32>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers ORDER BY name ASC",
            SUPPLIER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Fornecedor não encontrado".to_string()))
    }

    pub async fn create(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        let name = require_text(input.name.as_deref())?;
        let contact = require_text(input.contact.as_deref())?;
        let payment_terms = require_text(input.payment_terms.as_deref())?;
        let delivery_time = input
            .delivery_time
            .ok_or_else(|| AppError::ValidationError("Campos obrigatórios não preenchidos".to_string()))?;
        validate_delivery_time(delivery_time)?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (name, contact, phone, email, delivery_time, payment_terms, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(name)
        .bind(contact)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(delivery_time)
        .bind(payment_terms)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Supplier {} created", supplier.id);
        Ok(supplier)
    }

    pub async fn update(&self, id: Uuid, input: UpdateSupplierInput) -> AppResult<Supplier> {
        let existing = self.get(id).await?;

        if let Some(days) = input.delivery_time {
            validate_delivery_time(days)?;
        }
        for field in [&input.name, &input.contact, &input.payment_terms].into_iter().flatten() {
            require_text(Some(field))?;
        }

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = $1, contact = $2, phone = $3, email = $4, delivery_time = $5,
                payment_terms = $6, notes = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.contact.unwrap_or(existing.contact))
        .bind(input.phone.or(existing.phone))
        .bind(input.email.or(existing.email))
        .bind(input.delivery_time.unwrap_or(existing.delivery_time))
        .bind(input.payment_terms.unwrap_or(existing.payment_terms))
        .bind(input.notes.or(existing.notes))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    /// Hard delete, refused while live ingredients reference the supplier
    pub async fn delete(&self, id: Uuid) -> AppResult<Supplier> {
        let supplier = self.get(id).await?;

        let referencing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ingredients WHERE supplier_id = $1 AND status != 'deleted'",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        ensure_supplier_unreferenced(referencing)?;

        sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(supplier)
    }
}
