//! Staff registry
//!
//! Staff rows double as the application's user profiles. Deleting a member
//! keeps the row (status `deleted`) so history still resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    email_taken, ensure_status_change_allowed, require_text, EmailHolder, UserRole, UserStatus,
};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Staff service
#[derive(Clone)]
pub struct StaffService {
    db: PgPool,
}

/// A staff member / user profile
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StaffMember {
    pub id: Uuid,
    pub auth_uid: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub sector: String,
    pub position: String,
    pub shift: String,
    pub status: String,
    pub is_owner: bool,
    pub invited_by: Option<Uuid>,
    pub invited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

pub(crate) const STAFF_COLUMNS: &str = "id, auth_uid, name, email, phone, role, sector, position, shift, \
     status, is_owner, invited_by, invited_at, created_at, updated_at, deleted_at";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffInput {
    pub name: Option<String>,
    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub sector: Option<String>,
    pub position: Option<String>,
    pub shift: Option<String>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStaffInput {
    pub name: Option<String>,
    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub sector: Option<String>,
    pub position: Option<String>,
    pub shift: Option<String>,
    pub status: Option<UserStatus>,
}

fn select_by_id() -> String {
    format!("SELECT {} FROM users WHERE id = $1", STAFF_COLUMNS)
}

#[derive(sqlx::FromRow)]
struct EmailHolderRow {
    id: Uuid,
    status: String,
}

/// Whether another live account already uses `email`
pub(crate) async fn is_email_taken<'e, E>(
    executor: E,
    email: &str,
    exclude: Option<Uuid>,
) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, EmailHolderRow>(
        "SELECT id, status FROM users WHERE LOWER(email) = LOWER($1)",
    )
    .bind(email)
    .fetch_all(executor)
    .await?;

    let holders: Vec<EmailHolder> = rows
        .into_iter()
        .map(|row| EmailHolder {
            id: row.id,
            // Unknown statuses are treated as live
            status: row.status.parse().unwrap_or(UserStatus::Active),
        })
        .collect();

    Ok(email_taken(&holders, exclude))
}

impl StaffService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Every staff member that has not been deleted
    pub async fn list(&self) -> AppResult<Vec<StaffMember>> {
        let staff = sqlx::query_as::<_, StaffMember>(&format!(
            "SELECT {} FROM users WHERE status != 'deleted' ORDER BY name ASC",
            STAFF_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(staff)
    }

    /// Fetch by id, including deleted members
    pub async fn get(&self, id: Uuid) -> AppResult<StaffMember> {
        sqlx::query_as::<_, StaffMember>(&select_by_id())
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Funcionário não encontrado".to_string()))
    }

    pub async fn create(&self, input: CreateStaffInput) -> AppResult<StaffMember> {
        let name = require_text(input.name.as_deref())?;
        let email = require_text(input.email.as_deref())?.to_lowercase();
        let sector = require_text(input.sector.as_deref())?;
        let position = require_text(input.position.as_deref())?;
        let shift = require_text(input.shift.as_deref())?;
        let role = input
            .role
            .ok_or_else(|| AppError::ValidationError("Campos obrigatórios não preenchidos".to_string()))?;
        input.validate()?;

        if is_email_taken(&self.db, &email, None).await? {
            return Err(AppError::Conflict("Email já cadastrado".to_string()));
        }

        let status = input.status.unwrap_or(UserStatus::Active);

        let member = sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            INSERT INTO users (name, email, phone, role, sector, position, shift, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(name)
        .bind(&email)
        .bind(&input.phone)
        .bind(role.as_str())
        .bind(sector)
        .bind(position)
        .bind(shift)
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Staff member {} created", member.id);
        Ok(member)
    }

    pub async fn update(&self, id: Uuid, input: UpdateStaffInput) -> AppResult<StaffMember> {
        input.validate()?;
        let existing = self.get(id).await?;
        ensure_status_change_allowed(existing.is_owner, &existing.status, input.status)?;

        let email = match input.email.as_deref() {
            Some(email) => {
                let email = require_text(Some(email))?.to_lowercase();
                if is_email_taken(&self.db, &email, Some(id)).await? {
                    return Err(AppError::Conflict("Email já cadastrado".to_string()));
                }
                email
            }
            None => existing.email,
        };

        let name = match input.name.as_deref() {
            Some(name) => require_text(Some(name))?.to_string(),
            None => existing.name,
        };

        let member = sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            UPDATE users
            SET name = $1, email = $2, phone = $3, role = $4, sector = $5,
                position = $6, shift = $7, status = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(&name)
        .bind(&email)
        .bind(input.phone.or(existing.phone))
        .bind(input.role.map(|r| r.as_str().to_string()).unwrap_or(existing.role))
        .bind(input.sector.unwrap_or(existing.sector))
        .bind(input.position.unwrap_or(existing.position))
        .bind(input.shift.unwrap_or(existing.shift))
        .bind(input.status.map(|s| s.as_str().to_string()).unwrap_or(existing.status))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(member)
    }

    /// Soft delete
    pub async fn delete(&self, id: Uuid) -> AppResult<StaffMember> {
        let member = self.get(id).await?;
        if member.is_owner {
            return Err(AppError::InvalidStateTransition(
                "O proprietário não pode ser removido".to_string(),
            ));
        }

        sqlx::query("UPDATE users SET status = 'deleted', deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id_keeps_deleted_rows() {
        let sql = select_by_id();
        assert!(sql.ends_with("FROM users WHERE id = $1"));
        assert!(!sql.contains("deleted_at IS NULL"));
    }

    #[test]
    fn test_staff_email_is_checked() {
        let bad: UpdateStaffInput =
            serde_json::from_value(serde_json::json!({ "email": "sem-arroba" })).unwrap();
        assert!(bad.validate().is_err());

        let good: CreateStaffInput = serde_json::from_value(
            serde_json::json!({ "name": "Ana", "email": "ana@cozinha.com" }),
        )
        .unwrap();
        assert!(good.validate().is_ok());

        let no_email: UpdateStaffInput =
            serde_json::from_value(serde_json::json!({ "phone": "1199" })).unwrap();
        assert!(no_email.validate().is_ok());
    }

    #[test]
    fn test_status_payload_cannot_delete() {
        let input: UpdateStaffInput =
            serde_json::from_value(serde_json::json!({ "status": "deleted" })).unwrap();
        assert!(ensure_status_change_allowed(false, "active", input.status).is_err());
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Inactive)).is_err());
        assert!(ensure_status_change_allowed(false, "active", Some(UserStatus::Inactive)).is_ok());
    }
}
