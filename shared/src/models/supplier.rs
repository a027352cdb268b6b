//! Supplier rules

use crate::error::{DomainError, DomainResult};

/// Delivery lead time assumed when a supplier has none recorded
pub const DEFAULT_DELIVERY_DAYS: i32 = 7;

/// Validate a supplier lead time in days
pub fn validate_delivery_time(days: i32) -> DomainResult<()> {
    if days < 0 {
        return Err(DomainError::validation(
            "Tempo de entrega deve ser maior ou igual a zero",
        ));
    }
    Ok(())
}

/// Refuse deleting a supplier while live ingredients still reference it
pub fn ensure_supplier_unreferenced(referencing_ingredients: i64) -> DomainResult<()> {
    if referencing_ingredients > 0 {
        return Err(DomainError::invalid_state(format!(
            "Não é possível deletar. {} ingredientes usam este fornecedor.",
            referencing_ingredients
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_time() {
        assert!(validate_delivery_time(0).is_ok());
        assert!(validate_delivery_time(3).is_ok());
        assert!(validate_delivery_time(-1).is_err());
    }

    #[test]
    fn test_referenced_supplier_message() {
        let err = ensure_supplier_unreferenced(2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Não é possível deletar. 2 ingredientes usam este fornecedor."
        );
        assert!(ensure_supplier_unreferenced(0).is_ok());
    }
}
