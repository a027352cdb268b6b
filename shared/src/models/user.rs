//! Staff and account models

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

text_enum! {
    /// Access level of a staff member
    pub enum UserRole {
        Administrador => "administrador",
        Gerencia => "gerencia",
        Operacao => "operacao",
    }
}

text_enum! {
    pub enum UserStatus {
        Active => "active",
        Invited => "invited",
        Inactive => "inactive",
        Deleted => "deleted",
    }
}

/// Profile applied to the account created by the owner bootstrap
pub struct OwnerProfile;

impl OwnerProfile {
    pub const SECTOR: &'static str = "admin";
    pub const POSITION: &'static str = "Proprietário";
    pub const SHIFT: &'static str = "integral";
}

/// Minimal view of a user row sharing an email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailHolder {
    pub id: Uuid,
    pub status: UserStatus,
}

/// Whether an email is already taken by another live account.
///
/// Deleted rows keep their email for audit but never block reuse, and the
/// row being edited (`exclude`) never conflicts with itself.
pub fn email_taken(holders: &[EmailHolder], exclude: Option<Uuid>) -> bool {
    holders
        .iter()
        .filter(|h| Some(h.id) != exclude)
        .any(|h| h.status != UserStatus::Deleted)
}

/// Guard a status change requested through a profile edit.
///
/// Deletion has its own operation, and the owner's status is fixed.
pub fn ensure_status_change_allowed(
    is_owner: bool,
    current: &str,
    requested: Option<UserStatus>,
) -> DomainResult<()> {
    let Some(requested) = requested else {
        return Ok(());
    };
    if requested == UserStatus::Deleted {
        return Err(DomainError::validation(
            "Use a remoção de funcionário para excluir o cadastro",
        ));
    }
    if is_owner && requested.as_str() != current {
        return Err(DomainError::invalid_state(
            "O status do proprietário não pode ser alterado",
        ));
    }
    Ok(())
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Administrador)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(status: UserStatus) -> EmailHolder {
        EmailHolder {
            id: Uuid::new_v4(),
            status,
        }
    }

    #[test]
    fn test_deleted_rows_do_not_block_email() {
        let holders = vec![holder(UserStatus::Deleted), holder(UserStatus::Deleted)];
        assert!(!email_taken(&holders, None));
    }

    #[test]
    fn test_live_rows_block_email() {
        assert!(email_taken(&[holder(UserStatus::Active)], None));
        assert!(email_taken(&[holder(UserStatus::Invited)], None));
        assert!(email_taken(&[holder(UserStatus::Inactive)], None));
    }

    #[test]
    fn test_self_is_excluded_on_update() {
        let me = holder(UserStatus::Active);
        let id = me.id;
        assert!(!email_taken(&[me.clone()], Some(id)));
        assert!(email_taken(&[me, holder(UserStatus::Active)], Some(id)));
    }

    #[test]
    fn test_status_edit_guard() {
        assert!(ensure_status_change_allowed(false, "active", None).is_ok());
        assert!(ensure_status_change_allowed(false, "active", Some(UserStatus::Inactive)).is_ok());
        assert!(ensure_status_change_allowed(false, "active", Some(UserStatus::Deleted)).is_err());

        // Owner keeps its status, but resending the same value is harmless
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Active)).is_ok());
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Inactive)).is_err());
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Deleted)).is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("gerencia".parse::<UserRole>(), Ok(UserRole::Gerencia));
        assert!(UserRole::Administrador.is_admin());
        assert!(!UserRole::Operacao.is_admin());
        assert!("owner".parse::<UserRole>().is_err());
    }
}
