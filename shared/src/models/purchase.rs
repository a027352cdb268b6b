//! Purchase orders

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::types::{checked_product, checked_total};

/// Reason stored when a purchase is cancelled without one
pub const DEFAULT_CANCEL_REASON: &str = "Cancelado sem motivo informado";

text_enum! {
    pub enum PurchaseStatus {
        Pending => "pending",
        Partial => "partial",
        Received => "received",
        Cancelled => "cancelled",
    }
}

/// A requested item before it is priced into a purchase.
///
/// Draft carts hold these, and direct purchase creation accepts them too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A priced purchase line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Price a set of order lines.
///
/// Every line needs a positive unit price and a positive quantity. Returns
/// the priced items together with the order total.
pub fn price_order_lines(lines: &[OrderLine]) -> DomainResult<(Vec<PurchaseItem>, Decimal)> {
    if lines.is_empty() {
        return Err(DomainError::validation("Adicione pelo menos um item"));
    }
    if lines
        .iter()
        .any(|l| l.unit_price.map_or(true, |p| p <= Decimal::ZERO))
    {
        return Err(DomainError::validation(
            "Todos os itens devem ter preço unitário definido",
        ));
    }
    if lines.iter().any(|l| l.quantity <= Decimal::ZERO) {
        return Err(DomainError::validation(
            "Quantidade deve ser maior que zero",
        ));
    }

    let items = lines
        .iter()
        .map(|line| {
            let unit_price = line.unit_price.unwrap_or_default();
            Ok(PurchaseItem {
                ingredient_id: line.ingredient_id,
                ingredient_name: line.ingredient_name.clone(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                unit_price,
                total_price: checked_product(line.quantity, unit_price)?,
            })
        })
        .collect::<DomainResult<Vec<PurchaseItem>>>()?;
    let total = checked_total(items.iter().map(|i| i.total_price))?;

    Ok((items, total))
}

/// Next sequential order number for `year`, given the highest one issued
/// so far. Numbers look like `PED-2026-007`.
pub fn next_order_number(year: i32, last_issued: Option<&str>) -> String {
    let last = last_issued
        .and_then(|n| n.rsplit('-').next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .unwrap_or(0);
    format!("PED-{}-{:03}", year, last + 1)
}

/// Only pending purchases may have their lines or schedule edited
pub fn ensure_purchase_editable(status: PurchaseStatus) -> DomainResult<()> {
    if status != PurchaseStatus::Pending {
        return Err(DomainError::invalid_state(
            "Apenas pedidos pendentes podem ser alterados",
        ));
    }
    Ok(())
}

pub fn ensure_purchase_cancellable(status: PurchaseStatus) -> DomainResult<()> {
    match status {
        PurchaseStatus::Cancelled => Err(DomainError::invalid_state("Pedido já está cancelado")),
        PurchaseStatus::Received => Err(DomainError::invalid_state(
            "Não é possível cancelar um pedido já recebido",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(qty: &str, price: Option<&str>) -> OrderLine {
        OrderLine {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Tomate".to_string(),
            quantity: dec(qty),
            unit: "kg".to_string(),
            unit_price: price.map(dec),
            notes: None,
        }
    }

    #[test]
    fn test_price_order_lines() {
        let (items, total) =
            price_order_lines(&[line("2", Some("3.50")), line("1.5", Some("10"))]).unwrap();
        assert_eq!(items[0].total_price, dec("7.00"));
        assert_eq!(total, dec("22.00"));
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let huge = "100000000000000000000";
        let err = price_order_lines(&[line(huge, Some(huge))]).unwrap_err();
        assert_eq!(err.to_string(), "Valor do item excede o limite permitido");
    }

    #[test]
    fn test_negative_price_is_rejected() {
        assert!(price_order_lines(&[line("2", Some("-5"))]).is_err());
    }

    #[test]
    fn test_missing_or_zero_price_rejected() {
        let err = price_order_lines(&[line("2", Some("3")), line("1", None)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Todos os itens devem ter preço unitário definido"
        );
        assert!(price_order_lines(&[line("2", Some("0"))]).is_err());
    }

    #[test]
    fn test_empty_lines_rejected() {
        assert!(price_order_lines(&[]).is_err());
    }

    #[test]
    fn test_next_order_number() {
        assert_eq!(next_order_number(2026, None), "PED-2026-001");
        assert_eq!(next_order_number(2026, Some("PED-2026-009")), "PED-2026-010");
        assert_eq!(next_order_number(2026, Some("PED-2026-1234")), "PED-2026-1235");
        assert_eq!(next_order_number(2026, Some("garbage")), "PED-2026-001");
    }

    #[test]
    fn test_cancel_rules() {
        assert!(ensure_purchase_cancellable(PurchaseStatus::Pending).is_ok());
        assert!(ensure_purchase_cancellable(PurchaseStatus::Partial).is_ok());
        assert!(ensure_purchase_cancellable(PurchaseStatus::Received).is_err());
        assert!(ensure_purchase_cancellable(PurchaseStatus::Cancelled).is_err());
    }
}
