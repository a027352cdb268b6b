//! Validation helpers shared by the registry and workflow services

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Reject missing or blank required text fields
pub fn require_text(value: Option<&str>) -> DomainResult<&str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation("Campos obrigatórios não preenchidos")),
    }
}

/// Reject values that are not strictly positive
pub fn require_positive(value: Decimal, message: &str) -> DomainResult<()> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

/// Reject negative values
pub fn require_non_negative(value: Decimal, message: &str) -> DomainResult<()> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some(" Tomate ")), Ok("Tomate"));
        assert!(require_text(Some("   ")).is_err());
        assert!(require_text(None).is_err());
    }

    #[test]
    fn test_numeric_guards() {
        assert!(require_positive(Decimal::ONE, "x").is_ok());
        assert!(require_positive(Decimal::ZERO, "x").is_err());
        assert!(require_non_negative(Decimal::ZERO, "x").is_ok());
        assert!(require_non_negative(Decimal::NEGATIVE_ONE, "x").is_err());
    }
}
