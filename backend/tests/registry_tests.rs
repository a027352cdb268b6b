//! Registry rule tests
//!
//! Suppliers, staff accounts and recipe costing.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    cost_recipe, email_taken, ensure_status_change_allowed, ensure_supplier_unreferenced,
    validate_delivery_time, validate_recipe_header, EmailHolder, IngredientCostBasis,
    RecipeLineInput, UserRole, UserStatus,
};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_supplier_delete_guard_message() {
        assert!(ensure_supplier_unreferenced(0).is_ok());
        let err = ensure_supplier_unreferenced(3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Não é possível deletar. 3 ingredientes usam este fornecedor."
        );
    }

    #[test]
    fn test_zero_delivery_time_is_valid() {
        assert!(validate_delivery_time(0).is_ok());
        assert!(validate_delivery_time(-2).is_err());
    }

    #[test]
    fn test_soft_deleted_accounts_release_email() {
        let me = Uuid::new_v4();
        let holders = vec![
            EmailHolder { id: Uuid::new_v4(), status: UserStatus::Deleted },
            EmailHolder { id: me, status: UserStatus::Active },
        ];

        // Updating my own row keeps my email
        assert!(!email_taken(&holders, Some(me)));
        // Anyone else is blocked by my live row
        assert!(email_taken(&holders, None));
    }

    #[test]
    fn test_roles() {
        assert!(UserRole::Administrador.is_admin());
        assert!(!UserRole::Gerencia.is_admin());
        assert_eq!("operacao".parse::<UserRole>(), Ok(UserRole::Operacao));
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_staff_edit_cannot_delete_or_demote_owner() {
        // Deletion goes through the remove endpoint only
        let err = ensure_status_change_allowed(false, "active", Some(UserStatus::Deleted)).unwrap_err();
        assert_eq!(err.to_string(), "Use a remoção de funcionário para excluir o cadastro");
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Deleted)).is_err());

        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Inactive)).is_err());
        assert!(ensure_status_change_allowed(true, "active", Some(UserStatus::Active)).is_ok());
        assert!(ensure_status_change_allowed(true, "active", None).is_ok());
        assert!(ensure_status_change_allowed(false, "invited", Some(UserStatus::Active)).is_ok());
    }

    #[test]
    fn test_recipe_costing() {
        let tomato = Uuid::new_v4();
        let oil = Uuid::new_v4();
        let mut basis = HashMap::new();
        basis.insert(
            tomato,
            IngredientCostBasis {
                name: "Tomate".to_string(),
                unit: "kg".to_string(),
                price: dec("10"),
                net_qty: dec("0.8"),
            },
        );
        basis.insert(
            oil,
            IngredientCostBasis {
                name: "Azeite".to_string(),
                unit: "l".to_string(),
                price: dec("40"),
                net_qty: dec("1"),
            },
        );

        let lines = vec![
            RecipeLineInput { id: tomato, quantity: dec("2") },
            RecipeLineInput { id: oil, quantity: dec("0.1") },
            RecipeLineInput { id: Uuid::new_v4(), quantity: dec("1") },
        ];
        let costing = cost_recipe(&lines, &basis, dec("5"), dec("1"), 4).unwrap();

        // unknown ingredient dropped
        assert_eq!(costing.ingredients.len(), 2);
        assert_eq!(costing.ingredients[0].unit_cost, dec("12.5"));
        assert_eq!(costing.ingredients_cost, dec("29"));
        assert_eq!(costing.total_cost, dec("35"));
        assert_eq!(costing.cost_per_portion, dec("8.75"));
    }

    #[test]
    fn test_recipe_header() {
        assert!(validate_recipe_header(4, dec("30")).is_ok());
        assert!(validate_recipe_header(0, dec("30")).is_err());
        assert!(validate_recipe_header(4, Decimal::ZERO).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Deleted rows never block an email, whatever their number
    #[test]
    fn prop_deleted_never_block(n in 0usize..20) {
        let holders: Vec<EmailHolder> = (0..n)
            .map(|_| EmailHolder { id: Uuid::new_v4(), status: UserStatus::Deleted })
            .collect();
        prop_assert!(!email_taken(&holders, None));
    }

    /// Cost per portion times portions gives back the total
    #[test]
    fn prop_cost_per_portion(labor in 0i64..10_000, portions in 1i32..50) {
        let costing = cost_recipe(&[], &HashMap::new(), Decimal::new(labor, 2), Decimal::ZERO, portions).unwrap();
        let rebuilt = costing.cost_per_portion * Decimal::from(portions);
        prop_assert!((rebuilt - costing.total_cost).abs() < dec("0.0001"));
    }
}
