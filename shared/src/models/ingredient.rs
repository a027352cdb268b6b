//! Ingredient models and stock arithmetic

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::DEFAULT_DELIVERY_DAYS;
use crate::error::{DomainError, DomainResult};

/// Days kept in reserve on top of the supplier lead time
pub const SAFETY_BUFFER_DAYS: i32 = 3;

/// Storage center used to group ingredients that have none
pub const UNASSIGNED_STORAGE_CENTER: &str = "sem-centro";

/// Supplier name shown when an ingredient's supplier cannot be resolved
pub const UNKNOWN_SUPPLIER_NAME: &str = "Sem fornecedor";

text_enum! {
    pub enum IngredientCategory {
        Perecivel => "perecivel",
        NaoPerecivel => "nao-perecivel",
        Bebida => "bebida",
        Limpeza => "limpeza",
        Descartavel => "descartavel",
    }
}

impl IngredientCategory {
    /// Human readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            IngredientCategory::Perecivel => "Perecível",
            IngredientCategory::NaoPerecivel => "Não Perecível",
            IngredientCategory::Bebida => "Bebida",
            IngredientCategory::Limpeza => "Limpeza",
            IngredientCategory::Descartavel => "Descartável",
        }
    }
}

/// Report label for a stored category, falling back to the raw value
pub fn category_label(raw: &str) -> String {
    raw.parse::<IngredientCategory>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

text_enum! {
    /// Stock level relative to the configured thresholds
    pub enum StockStatus {
        Ok => "ok",
        Low => "low",
        Critical => "critical",
        Excess => "excess",
    }
}

/// Classify a stock level.
///
/// Above `max` is excess, below half of `min` is critical, below `min` is
/// low. A missing `max` never reports excess.
pub fn classify_stock(current: Decimal, min: Decimal, max: Option<Decimal>) -> StockStatus {
    if let Some(max) = max {
        if current > max {
            return StockStatus::Excess;
        }
    }
    if current < min * Decimal::new(5, 1) {
        StockStatus::Critical
    } else if current < min {
        StockStatus::Low
    } else {
        StockStatus::Ok
    }
}

/// Usable fraction of a purchased quantity (`net / gross`)
pub fn yield_factor(gross_qty: Decimal, net_qty: Decimal) -> Decimal {
    net_qty.checked_div(gross_qty).unwrap_or(Decimal::ZERO)
}

/// Cost of one usable unit (`price / net`)
pub fn unit_cost(price: Decimal, net_qty: Decimal) -> Decimal {
    if net_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    price.checked_div(net_qty).unwrap_or(Decimal::ZERO)
}

/// Value of the stock on hand, priced per gross unit. Saturates instead of
/// overflowing.
pub fn stock_value(current_stock: Decimal, price: Decimal, gross_qty: Decimal) -> Decimal {
    let gross = if gross_qty > Decimal::ZERO {
        gross_qty
    } else {
        Decimal::ONE
    };
    current_stock.saturating_mul(price.checked_div(gross).unwrap_or(Decimal::ZERO))
}

/// Ratio of current to minimum stock, used to rank shortages
pub fn min_stock_ratio(current: Decimal, min: Decimal) -> Decimal {
    if min <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    current.checked_div(min).unwrap_or(Decimal::ZERO)
}

/// Date by which a reorder should be placed so stock never drops under the
/// minimum, given the average consumption and the supplier lead time.
///
/// Returns `None` when consumption is unknown or not positive.
pub fn reorder_date(
    today: NaiveDate,
    current: Decimal,
    min: Decimal,
    avg_daily_consumption: Option<Decimal>,
    delivery_days: Option<i32>,
) -> Option<NaiveDate> {
    let avg = avg_daily_consumption.filter(|a| *a > Decimal::ZERO)?;
    let days_to_min = (current - min).checked_div(avg)?;
    let lead = Decimal::from(delivery_days.unwrap_or(DEFAULT_DELIVERY_DAYS) + SAFETY_BUFFER_DAYS);
    let reorder_in = (days_to_min - lead).max(Decimal::ZERO).floor();
    today.checked_add_days(Days::new(reorder_in.to_u64()?))
}

/// Quantities and thresholds that must be consistent on every ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientQuantities {
    pub gross_qty: Decimal,
    pub net_qty: Decimal,
    pub price: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
}

impl IngredientQuantities {
    pub fn validate(&self) -> DomainResult<()> {
        if self.gross_qty <= Decimal::ZERO {
            return Err(DomainError::validation(
                "Quantidade bruta deve ser maior que zero",
            ));
        }
        if self.net_qty <= Decimal::ZERO {
            return Err(DomainError::validation(
                "Quantidade líquida deve ser maior que zero",
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::validation("Preço deve ser maior que zero"));
        }
        if self.min_stock < Decimal::ZERO {
            return Err(DomainError::validation(
                "Estoque mínimo não pode ser negativo",
            ));
        }
        if self.max_stock < Decimal::ZERO {
            return Err(DomainError::validation(
                "Estoque máximo não pode ser negativo",
            ));
        }
        if self.net_qty > self.gross_qty {
            return Err(DomainError::validation(
                "Quantidade líquida não pode ser maior que quantidade bruta",
            ));
        }
        if self.max_stock < self.min_stock {
            return Err(DomainError::validation(
                "Estoque máximo não pode ser menor que estoque mínimo",
            ));
        }
        Ok(())
    }

    pub fn yield_factor(&self) -> Decimal {
        yield_factor(self.gross_qty, self.net_qty)
    }
}

/// Counts of ingredients per stock status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub total: usize,
    pub ok: usize,
    pub low: usize,
    pub critical: usize,
    pub excess: usize,
}

impl StockSummary {
    pub fn tally<I: IntoIterator<Item = StockStatus>>(statuses: I) -> Self {
        statuses.into_iter().fold(Self::default(), |mut acc, status| {
            acc.total += 1;
            match status {
                StockStatus::Ok => acc.ok += 1,
                StockStatus::Low => acc.low += 1,
                StockStatus::Critical => acc.critical += 1,
                StockStatus::Excess => acc.excess += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_classify_thresholds() {
        let min = dec("10");
        let max = Some(dec("50"));
        assert_eq!(classify_stock(dec("4.99"), min, max), StockStatus::Critical);
        assert_eq!(classify_stock(dec("5"), min, max), StockStatus::Low);
        assert_eq!(classify_stock(dec("9.99"), min, max), StockStatus::Low);
        assert_eq!(classify_stock(dec("10"), min, max), StockStatus::Ok);
        assert_eq!(classify_stock(dec("50"), min, max), StockStatus::Ok);
        assert_eq!(classify_stock(dec("50.01"), min, max), StockStatus::Excess);
    }

    #[test]
    fn test_classify_without_max_never_excess() {
        assert_eq!(classify_stock(dec("100000"), dec("10"), None), StockStatus::Ok);
    }

    #[test]
    fn test_yield_factor() {
        assert_eq!(yield_factor(dec("10"), dec("8")), dec("0.8"));
        assert_eq!(yield_factor(Decimal::ZERO, dec("8")), Decimal::ZERO);
    }

    #[test]
    fn test_unit_cost() {
        assert_eq!(unit_cost(dec("40"), dec("8")), dec("5"));
        assert_eq!(unit_cost(dec("40"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_reorder_date_without_consumption() {
        let today = date(2026, 3, 1);
        assert_eq!(reorder_date(today, dec("100"), dec("10"), None, Some(2)), None);
        assert_eq!(
            reorder_date(today, dec("100"), dec("10"), Some(Decimal::ZERO), Some(2)),
            None
        );
    }

    #[test]
    fn test_reorder_date_with_consumption() {
        let today = date(2026, 3, 1);
        // (100 - 10) / 5 = 18 days to min, minus 2 lead and 3 buffer = 13
        assert_eq!(
            reorder_date(today, dec("100"), dec("10"), Some(dec("5")), Some(2)),
            Some(date(2026, 3, 14))
        );
        // default lead of 7: 18 - 10 = 8
        assert_eq!(
            reorder_date(today, dec("100"), dec("10"), Some(dec("5")), None),
            Some(date(2026, 3, 9))
        );
    }

    #[test]
    fn test_reorder_date_is_today_when_late() {
        let today = date(2026, 3, 1);
        assert_eq!(
            reorder_date(today, dec("5"), dec("10"), Some(dec("1")), Some(2)),
            Some(today)
        );
    }

    #[test]
    fn test_reorder_date_floors_fractional_days() {
        let today = date(2026, 3, 1);
        // (30 - 10) / 3 = 6.67, minus 5 = 1.67 -> 1
        assert_eq!(
            reorder_date(today, dec("30"), dec("10"), Some(dec("3")), Some(2)),
            Some(date(2026, 3, 2))
        );
    }

    #[test]
    fn test_quantities_validation() {
        let ok = IngredientQuantities {
            gross_qty: dec("10"),
            net_qty: dec("8"),
            price: dec("25"),
            min_stock: dec("2"),
            max_stock: dec("20"),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.yield_factor(), dec("0.8"));

        let net_over_gross = IngredientQuantities {
            net_qty: dec("12"),
            ..ok
        };
        assert!(net_over_gross.validate().is_err());

        let max_under_min = IngredientQuantities {
            max_stock: dec("1"),
            ..ok
        };
        assert!(max_under_min.validate().is_err());

        let free = IngredientQuantities {
            price: Decimal::ZERO,
            ..ok
        };
        assert!(free.validate().is_err());
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(stock_value(dec("4"), dec("50"), dec("10")), dec("20"));
        assert_eq!(stock_value(dec("4"), dec("50"), Decimal::ZERO), dec("200"));
        let huge = dec("100000000000000000000");
        assert_eq!(stock_value(huge, huge, Decimal::ONE), Decimal::MAX);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("nao-perecivel"), "Não Perecível");
        assert_eq!(category_label("outros"), "outros");
    }

    #[test]
    fn test_summary_tally() {
        let summary = StockSummary::tally(vec![
            StockStatus::Ok,
            StockStatus::Low,
            StockStatus::Low,
            StockStatus::Critical,
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.excess, 0);
    }
}
