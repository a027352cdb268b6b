//! Stock level tests
//!
//! Covers the derived values shown on the stock screens:
//! - stock status thresholds (critical, low, ok, excess)
//! - yield factor and ingredient quantity rules
//! - stock value and reorder dates
//! - inventory count discrepancies

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    classify_stock, discrepancies, min_stock_ratio, prepare_count_items, reorder_date,
    stock_value, yield_factor, CountItemInput, IngredientQuantities, StockStatus, StockSummary,
};
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn quantities(gross: &str, net: &str, min: &str, max: &str) -> IngredientQuantities {
    IngredientQuantities {
        gross_qty: dec(gross),
        net_qty: dec(net),
        price: dec("10"),
        min_stock: dec(min),
        max_stock: dec(max),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_status_thresholds() {
        let min = dec("10");
        let max = Some(dec("50"));

        assert_eq!(classify_stock(dec("4.9"), min, max), StockStatus::Critical);
        assert_eq!(classify_stock(dec("5"), min, max), StockStatus::Low);
        assert_eq!(classify_stock(dec("9.99"), min, max), StockStatus::Low);
        assert_eq!(classify_stock(dec("10"), min, max), StockStatus::Ok);
        assert_eq!(classify_stock(dec("50"), min, max), StockStatus::Ok);
        assert_eq!(classify_stock(dec("50.01"), min, max), StockStatus::Excess);
    }

    #[test]
    fn test_no_max_never_excess() {
        assert_eq!(
            classify_stock(dec("100000"), dec("1"), None),
            StockStatus::Ok
        );
    }

    #[test]
    fn test_summary_counts() {
        let summary = StockSummary::tally(vec![
            StockStatus::Ok,
            StockStatus::Critical,
            StockStatus::Critical,
            StockStatus::Excess,
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.critical, 2);
        assert_eq!(summary.excess, 1);
        assert_eq!(summary.low, 0);
    }

    #[test]
    fn test_yield_factor() {
        assert_eq!(yield_factor(dec("10"), dec("8")), dec("0.8"));
        assert_eq!(quantities("5", "5", "0", "0").yield_factor(), Decimal::ONE);
    }

    #[test]
    fn test_quantity_rules() {
        assert!(quantities("10", "8", "2", "20").validate().is_ok());
        // net above gross
        assert!(quantities("10", "11", "2", "20").validate().is_err());
        // max below min
        assert!(quantities("10", "8", "20", "2").validate().is_err());
        assert!(quantities("0", "0", "0", "0").validate().is_err());
    }

    #[test]
    fn test_stock_value_uses_gross_unit_price() {
        // 20 units, R$ 50 per 5 units
        assert_eq!(stock_value(dec("20"), dec("50"), dec("5")), dec("200"));
    }

    #[test]
    fn test_reorder_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        // 30 above minimum at 2/day is 15 days; minus 7 lead + 3 buffer leaves 5
        let date = reorder_date(today, dec("40"), dec("10"), Some(dec("2")), Some(7));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 6));

        // Already inside the lead time: reorder today
        let date = reorder_date(today, dec("12"), dec("10"), Some(dec("2")), Some(7));
        assert_eq!(date, Some(today));

        assert_eq!(reorder_date(today, dec("40"), dec("10"), None, Some(7)), None);
        assert_eq!(
            reorder_date(today, dec("40"), dec("10"), Some(Decimal::ZERO), Some(7)),
            None
        );
    }

    #[test]
    fn test_count_discrepancies() {
        let line = |system: &str, counted: &str| CountItemInput {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Farinha".to_string(),
            unit: "kg".to_string(),
            system_qty: dec(system),
            counted_qty: dec(counted),
        };

        let (items, total) =
            prepare_count_items(vec![line("10", "10"), line("4", "3.5"), line("0", "2")]).unwrap();

        let changed: Vec<_> = discrepancies(&items).collect();
        assert_eq!(changed.len(), 2);
        assert_eq!(total, dec("2.5"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn stock_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Status follows the thresholds exactly
    #[test]
    fn prop_status_matches_thresholds(current in stock_amount(), min in stock_amount(), extra in stock_amount()) {
        let max = min + extra;
        let status = classify_stock(current, min, Some(max));

        let expected = if current > max {
            StockStatus::Excess
        } else if current < min / Decimal::from(2) {
            StockStatus::Critical
        } else if current < min {
            StockStatus::Low
        } else {
            StockStatus::Ok
        };
        prop_assert_eq!(status, expected);
    }

    /// Yield never exceeds one for valid quantities
    #[test]
    fn prop_yield_bounded(gross in 1i64..10_000, net_share in 1i64..=100) {
        let gross = Decimal::from(gross);
        let net = (gross * Decimal::from(net_share) / Decimal::from(100)).max(Decimal::new(1, 2));
        let q = IngredientQuantities {
            gross_qty: gross,
            net_qty: net,
            price: Decimal::ONE,
            min_stock: Decimal::ZERO,
            max_stock: Decimal::ZERO,
        };
        prop_assert!(q.validate().is_ok());
        prop_assert!(q.yield_factor() <= Decimal::ONE);
        prop_assert!(q.yield_factor() > Decimal::ZERO);
    }

    /// Shortage ranking grows with the stock on hand
    #[test]
    fn prop_ratio_monotonic(a in stock_amount(), b in stock_amount(), min in 1i64..1000) {
        let min = Decimal::from(min);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(min_stock_ratio(low, min) <= min_stock_ratio(high, min));
    }
}
