//! Account bootstrap and staff invitations
//!
//! Credentials live with the identity provider. This service provisions
//! provider accounts and keeps the matching `users` rows.

use serde::{Deserialize, Serialize};
use shared::{OwnerProfile, UserRole, UserStatus};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::IdentityClient;
use crate::services::staff::{is_email_taken, StaffMember, STAFF_COLUMNS};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    identity: IdentityClient,
}

/// Input for creating the first administrator
#[derive(Debug, Deserialize, Validate)]
pub struct SetupOwnerInput {
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres"))]
    pub password: String,
    #[validate(length(min = 1, message = "Campos obrigatórios não preenchidos"))]
    pub name: String,
    pub phone: Option<String>,
}

/// Input for inviting a staff member
#[derive(Debug, Deserialize, Validate)]
pub struct InviteInput {
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    #[validate(length(min = 1, message = "Campos obrigatórios não preenchidos"))]
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub sector: Option<String>,
    pub position: Option<String>,
    pub shift: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResendInviteInput {
    pub user_id: Uuid,
}

/// A created invitation
#[derive(Debug, Serialize)]
pub struct Invitation {
    pub user: StaffMember,
    pub invite_link: String,
}

impl AuthService {
    pub fn new(db: PgPool, identity: IdentityClient) -> Self {
        Self { db, identity }
    }

    /// Create the owner account. Only allowed while no active administrator
    /// exists.
    pub async fn setup_owner(&self, input: SetupOwnerInput) -> AppResult<StaffMember> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let admins = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = $1 AND status = 'active'",
        )
        .bind(UserRole::Administrador.as_str())
        .fetch_one(&self.db)
        .await?;

        if admins > 0 {
            return Err(AppError::Conflict(
                "Já existe um administrador cadastrado".to_string(),
            ));
        }

        let uid = self
            .identity
            .create_account(&email, &input.password, input.name.trim())
            .await?;

        let owner = sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            INSERT INTO users (auth_uid, name, email, phone, role, sector, position, shift, status, is_owner)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(&uid)
        .bind(input.name.trim())
        .bind(&email)
        .bind(&input.phone)
        .bind(UserRole::Administrador.as_str())
        .bind(OwnerProfile::SECTOR)
        .bind(OwnerProfile::POSITION)
        .bind(OwnerProfile::SHIFT)
        .bind(UserStatus::Active.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Owner account created: {}", owner.id);
        Ok(owner)
    }

    /// Provision an account with a throwaway password and return a
    /// password-reset link for the invitee
    pub async fn invite(&self, invited_by: Uuid, input: InviteInput) -> AppResult<Invitation> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        if is_email_taken(&self.db, &email, None).await? {
            return Err(AppError::Conflict("Email já cadastrado".to_string()));
        }

        let temporary_password = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let uid = self
            .identity
            .create_account(&email, &temporary_password, input.name.trim())
            .await?;
        let invite_link = self.identity.password_reset_link(&email).await?;

        let user = sqlx::query_as::<_, StaffMember>(&format!(
            r#"
            INSERT INTO users (auth_uid, name, email, phone, role, sector, position, shift,
                               status, invited_by, invited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(&uid)
        .bind(input.name.trim())
        .bind(&email)
        .bind(&input.phone)
        .bind(input.role.as_str())
        .bind(input.sector.unwrap_or_default())
        .bind(input.position.unwrap_or_default())
        .bind(input.shift.unwrap_or_default())
        .bind(UserStatus::Invited.as_str())
        .bind(invited_by)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Invited {} as {}", user.id, input.role);
        Ok(Invitation { user, invite_link })
    }

    /// Issue a fresh invite link for a user still in the invited state
    pub async fn resend_invite(&self, user_id: Uuid) -> AppResult<Invitation> {
        let user = sqlx::query_as::<_, StaffMember>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            STAFF_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        if user.status != UserStatus::Invited.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Usuário não está com convite pendente".to_string(),
            ));
        }

        let invite_link = self.identity.password_reset_link(&user.email).await?;
        Ok(Invitation { user, invite_link })
    }

    /// Profile behind an identity provider account
    pub async fn me(&self, auth_uid: &str) -> AppResult<StaffMember> {
        sqlx::query_as::<_, StaffMember>(&format!(
            "SELECT {} FROM users WHERE auth_uid = $1 AND status IN ('active', 'invited')",
            STAFF_COLUMNS
        ))
        .bind(auth_uid)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_owner_input_validation() {
        let input = SetupOwnerInput {
            email: "dono@restaurante.com".into(),
            password: "123".into(),
            name: "Dono".into(),
            phone: None,
        };
        assert!(input.validate().is_err());

        let input = SetupOwnerInput {
            password: "123456".into(),
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_invite_rejects_bad_email() {
        let input = InviteInput {
            email: "sem-arroba".into(),
            name: "Ana".into(),
            role: UserRole::Operacao,
            phone: None,
            sector: None,
            position: None,
            shift: None,
        };
        assert!(input.validate().is_err());
    }
}
