//! Physical inventory counts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::types::{checked_total, AMOUNT_OVERFLOW};

text_enum! {
    pub enum CountStatus {
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// A counted line as submitted by staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountItemInput {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub system_qty: Decimal,
    pub counted_qty: Decimal,
}

/// A counted line with its discrepancy against the system level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountItem {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub system_qty: Decimal,
    pub counted_qty: Decimal,
    pub difference: Decimal,
}

/// Compute per-line differences and the sum of absolute differences
pub fn prepare_count_items(inputs: Vec<CountItemInput>) -> DomainResult<(Vec<CountItem>, Decimal)> {
    if inputs.iter().any(|i| i.counted_qty < Decimal::ZERO) {
        return Err(DomainError::validation(
            "Quantidade contada não pode ser negativa",
        ));
    }
    let items = inputs
        .into_iter()
        .map(|input| {
            let difference = input
                .counted_qty
                .checked_sub(input.system_qty)
                .ok_or_else(|| DomainError::validation(AMOUNT_OVERFLOW))?;
            Ok(CountItem {
                difference,
                ingredient_id: input.ingredient_id,
                ingredient_name: input.ingredient_name,
                unit: input.unit,
                system_qty: input.system_qty,
                counted_qty: input.counted_qty,
            })
        })
        .collect::<DomainResult<Vec<CountItem>>>()?;
    let total = checked_total(items.iter().map(|i| i.difference.abs()))?;
    Ok((items, total))
}

/// Lines whose counted quantity must overwrite the stock level
pub fn discrepancies(items: &[CountItem]) -> impl Iterator<Item = &CountItem> {
    items.iter().filter(|i| !i.difference.is_zero())
}

/// Counts can only change while they are in progress
pub fn ensure_count_open(status: CountStatus) -> DomainResult<()> {
    if status != CountStatus::InProgress {
        return Err(DomainError::invalid_state(
            "Contagem já foi finalizada ou cancelada",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(system: i64, counted: i64) -> CountItemInput {
        CountItemInput {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Açúcar".to_string(),
            unit: "kg".to_string(),
            system_qty: Decimal::from(system),
            counted_qty: Decimal::from(counted),
        }
    }

    #[test]
    fn test_differences() {
        let (items, total) =
            prepare_count_items(vec![input(10, 8), input(5, 7), input(3, 3)]).unwrap();
        assert_eq!(items[0].difference, Decimal::from(-2));
        assert_eq!(items[1].difference, Decimal::from(2));
        assert_eq!(total, Decimal::from(4));
        assert_eq!(discrepancies(&items).count(), 2);
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(prepare_count_items(vec![input(1, -1)]).is_err());
    }

    #[test]
    fn test_overflowing_totals_rejected() {
        let mut huge = input(0, 0);
        huge.counted_qty = Decimal::MAX;
        assert!(prepare_count_items(vec![huge.clone(), huge]).is_err());
    }

    #[test]
    fn test_open_guard() {
        assert!(ensure_count_open(CountStatus::InProgress).is_ok());
        assert!(ensure_count_open(CountStatus::Completed).is_err());
        assert!(ensure_count_open(CountStatus::Cancelled).is_err());
    }
}
