//! Purchasing and receiving workflow tests
//!
//! Covers the rules shared by draft finalization, purchase creation and goods
//! receiving:
//! - pricing and rejection of unpriced carts
//! - one checklist line per purchase item
//! - completion guards and the stock increments a delivery produces
//! - order numbering

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_checklist_update, build_checklist, draft_total, next_order_number, plan_completion,
    plan_finalize, price_order_lines, receiving_totals, ChecklistUpdate, OrderLine,
    PurchaseStatus, ReceivingStatus,
};
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(name: &str, qty: &str, price: Option<&str>) -> OrderLine {
    OrderLine {
        ingredient_id: Uuid::new_v4(),
        ingredient_name: name.to_string(),
        quantity: dec(qty),
        unit: "kg".to_string(),
        unit_price: price.map(dec),
        notes: None,
    }
}

fn received(qty: &str) -> ChecklistUpdate {
    ChecklistUpdate {
        is_received: true,
        received_qty: Some(dec(qty)),
        ..Default::default()
    }
}

fn missing() -> ChecklistUpdate {
    ChecklistUpdate {
        is_received: false,
        received_qty: Some(dec("99")),
        missing_reason: Some("Em falta no fornecedor".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_finalize_prices_cart() {
        let plan = plan_finalize(&[
            line("Tomate", "10", Some("4.50")),
            line("Cebola", "5", Some("3")),
        ])
        .unwrap();

        assert_eq!(plan.total_value, dec("60"));
        assert_eq!(plan.items[0].total_price, dec("45"));
        assert_eq!(plan.checklist.len(), plan.items.len());
        assert!(plan.checklist.iter().all(|c| !c.is_checked));
    }

    #[test]
    fn test_finalize_rejects_unpriced_lines() {
        let err = plan_finalize(&[line("Tomate", "10", Some("4")), line("Alho", "1", None)])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Todos os itens devem ter preço unitário definido"
        );
        assert!(plan_finalize(&[line("Alho", "1", Some("0"))]).is_err());
        assert!(plan_finalize(&[line("Alho", "1", Some("-3"))]).is_err());
        assert!(plan_finalize(&[]).is_err());
    }

    #[test]
    fn test_oversized_order_is_rejected_not_panicking() {
        let huge = "100000000000000000000";
        let result = std::panic::catch_unwind(|| price_order_lines(&[line("Trufa", huge, Some(huge))]));
        let err = result.expect("pricing must not panic").unwrap_err();
        assert_eq!(err.to_string(), "Valor do item excede o limite permitido");

        assert!(plan_finalize(&[line("Trufa", huge, Some(huge))]).is_err());
        assert!(draft_total(&[line("Trufa", huge, Some(huge))]).is_err());
    }

    #[test]
    fn test_draft_total_ignores_unpriced() {
        let total = draft_total(&[line("Tomate", "2", Some("5")), line("Alho", "1", None)]).unwrap();
        assert_eq!(total, dec("10"));
    }

    #[test]
    fn test_order_numbers() {
        assert_eq!(next_order_number(2026, None), "PED-2026-001");
        assert_eq!(next_order_number(2026, Some("PED-2026-009")), "PED-2026-010");
        assert_eq!(next_order_number(2026, Some("PED-2026-999")), "PED-2026-1000");
    }

    #[test]
    fn test_checklist_index_out_of_range() {
        let (items, _) = price_order_lines(&[line("Tomate", "1", Some("1"))]).unwrap();
        let mut checklist = build_checklist(&items);

        let err = apply_checklist_update(
            ReceivingStatus::AwaitingDelivery,
            &mut checklist,
            3,
            received("1"),
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Item do checklist inválido");
    }

    #[test]
    fn test_missing_line_keeps_zero_quantity() {
        let (items, _) = price_order_lines(&[line("Tomate", "1", Some("1"))]).unwrap();
        let mut checklist = build_checklist(&items);

        apply_checklist_update(
            ReceivingStatus::InProgress,
            &mut checklist,
            0,
            missing(),
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap();

        assert!(checklist[0].is_checked);
        assert!(!checklist[0].is_received);
        assert_eq!(checklist[0].received_qty, Decimal::ZERO);
    }

    #[test]
    fn test_completion_requires_photo_and_full_check() {
        let (items, _) = price_order_lines(&[
            line("Tomate", "10", Some("2")),
            line("Cebola", "4", Some("3")),
        ])
        .unwrap();
        let mut checklist = build_checklist(&items);
        let by = Uuid::new_v4();

        let err = plan_completion(ReceivingStatus::InProgress, false, &checklist).unwrap_err();
        assert_eq!(err.to_string(), "Foto da nota fiscal é obrigatória");

        apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, 0, received("10"), by, Utc::now())
            .unwrap();
        assert!(plan_completion(ReceivingStatus::InProgress, true, &checklist).is_err());

        apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, 1, missing(), by, Utc::now())
            .unwrap();
        let plan = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap();

        assert_eq!(plan.increments.len(), 1);
        assert_eq!(plan.increments[0].quantity, dec("10"));
        assert_eq!(plan.purchase_status, Some(PurchaseStatus::Partial));
    }

    #[test]
    fn test_increments_skip_missing_and_zero_lines() {
        let (items, _) = price_order_lines(&[
            line("Tomate", "10", Some("2")),
            line("Cebola", "4", Some("3")),
            line("Alho", "1", Some("20")),
            line("Azeite", "2", Some("35")),
        ])
        .unwrap();
        let mut checklist = build_checklist(&items);
        let by = Uuid::new_v4();

        let updates = [received("8"), missing(), received("0"), received("2")];
        for (i, update) in updates.into_iter().enumerate() {
            apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, i, update, by, Utc::now())
                .unwrap();
        }

        let plan = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap();
        let names: Vec<&str> = plan
            .increments
            .iter()
            .map(|inc| inc.ingredient_name.as_str())
            .collect();
        assert_eq!(names, vec!["Tomate", "Azeite"]);
        assert_eq!(plan.increments[0].quantity, dec("8"));
        assert_eq!(plan.purchase_status, Some(PurchaseStatus::Partial));
    }

    #[test]
    fn test_completed_receiving_is_closed() {
        assert!(plan_completion(ReceivingStatus::Completed, true, &[]).is_err());
        assert!(plan_completion(ReceivingStatus::Cancelled, true, &[]).is_err());
    }

    #[test]
    fn test_full_delivery_marks_received() {
        let (items, total) = price_order_lines(&[line("Tomate", "10", Some("2"))]).unwrap();
        let mut checklist = build_checklist(&items);
        apply_checklist_update(
            ReceivingStatus::AwaitingDelivery,
            &mut checklist,
            0,
            received("12"),
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap();

        let plan = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap();
        assert_eq!(plan.purchase_status, Some(PurchaseStatus::Received));

        let totals = receiving_totals(&checklist, total).unwrap();
        assert_eq!(totals.received_total_value, dec("24"));
        assert_eq!(totals.adjustment_value, dec("-4"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn priced_line() -> impl Strategy<Value = OrderLine> {
    (1i64..1_000, 1i64..100_000).prop_map(|(qty, cents)| OrderLine {
        ingredient_id: Uuid::new_v4(),
        ingredient_name: "Item".to_string(),
        quantity: Decimal::from(qty),
        unit: "un".to_string(),
        unit_price: Some(Decimal::new(cents, 2)),
        notes: None,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A receiving has exactly one checklist line per purchase item
    #[test]
    fn prop_checklist_matches_items(lines in prop::collection::vec(priced_line(), 1..20)) {
        let plan = plan_finalize(&lines).unwrap();
        prop_assert_eq!(plan.checklist.len(), lines.len());
        prop_assert_eq!(plan.items.len(), lines.len());
    }

    /// The order total is the sum of its line totals
    #[test]
    fn prop_total_is_sum_of_lines(lines in prop::collection::vec(priced_line(), 1..20)) {
        let (items, total) = price_order_lines(&lines).unwrap();
        let expected: Decimal = lines
            .iter()
            .map(|l| l.quantity * l.unit_price.unwrap())
            .sum();
        prop_assert_eq!(total, expected);
        prop_assert_eq!(items.iter().map(|i| i.total_price).sum::<Decimal>(), expected);
    }

    /// Only lines received with a positive quantity yield a stock increment
    #[test]
    fn prop_one_increment_per_received_line(
        lines in prop::collection::vec(priced_line(), 1..15),
        outcomes in prop::collection::vec(0u8..3, 15),
    ) {
        let plan = plan_finalize(&lines).unwrap();
        let mut checklist = plan.checklist;
        let by = Uuid::new_v4();

        for i in 0..checklist.len() {
            let update = match outcomes[i] {
                0 => ChecklistUpdate {
                    is_received: true,
                    received_qty: Some(checklist[i].ordered_qty),
                    ..Default::default()
                },
                1 => received("0"),
                _ => missing(),
            };
            apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, i, update, by, Utc::now())
                .unwrap();
        }

        let completion = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap();
        let stocked = outcomes.iter().take(checklist.len()).filter(|o| **o == 0).count();
        prop_assert_eq!(completion.increments.len(), stocked);
    }
}
