//! Draft order carts and their conversion into purchases

use std::fmt::Write as _;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{build_checklist, price_order_lines, ChecklistItem, OrderLine, PurchaseItem};
use crate::error::DomainResult;
use crate::types::{checked_product, checked_total};

text_enum! {
    /// What happened to the cart when an item was added
    pub enum DraftAction {
        Created => "created",
        Updated => "updated",
    }
}

/// Running value of a cart, counting only priced lines
pub fn draft_total(items: &[OrderLine]) -> DomainResult<Decimal> {
    let priced = items
        .iter()
        .filter_map(|item| item.unit_price.map(|price| checked_product(item.quantity, price)))
        .collect::<DomainResult<Vec<_>>>()?;
    checked_total(priced)
}

/// Records derived from a cart when it is finalized
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizePlan {
    pub items: Vec<PurchaseItem>,
    pub total_value: Decimal,
    pub checklist: Vec<ChecklistItem>,
}

/// Price the cart and derive the receiving checklist.
///
/// Rejects carts with any unpriced or zero-priced line.
pub fn plan_finalize(items: &[OrderLine]) -> DomainResult<FinalizePlan> {
    let (items, total_value) = price_order_lines(items)?;
    let checklist = build_checklist(&items);
    Ok(FinalizePlan {
        items,
        total_value,
        checklist,
    })
}

/// Inputs for the order text sent to the supplier
#[derive(Debug, Clone)]
pub struct SupplierMessage<'a> {
    pub restaurant: &'a str,
    pub order_date: NaiveDate,
    pub supplier_name: &'a str,
    pub order_number: &'a str,
    pub expected_delivery: Option<NaiveDate>,
    pub items: &'a [PurchaseItem],
    pub total_value: Decimal,
    pub notes: Option<&'a str>,
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

impl SupplierMessage<'_> {
    /// Render the plain-text order, ready to paste into a chat or email
    pub fn render(&self) -> String {
        let mut out = String::new();
        let delivery = self
            .expected_delivery
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "A combinar".to_string());

        let _ = writeln!(out, "Pedido {}", self.restaurant);
        let _ = writeln!(out, "Data: {}", self.order_date.format("%d/%m/%Y"));
        out.push('\n');
        let _ = writeln!(out, "Fornecedor: {}", self.supplier_name);
        let _ = writeln!(out, "Número do Pedido: {}", self.order_number);
        let _ = writeln!(out, "Prazo de Entrega: {}", delivery);
        out.push('\n');
        out.push_str("ITENS SOLICITADOS:\n");
        for item in self.items {
            let _ = writeln!(
                out,
                "• {} - {} {} × R$ {} = R$ {}",
                item.ingredient_name,
                item.quantity.normalize(),
                item.unit,
                money(item.unit_price),
                money(item.total_price),
            );
        }
        let _ = writeln!(out, "\nVALOR TOTAL: R$ {}", money(self.total_value));
        out.push('\n');
        if let Some(notes) = self.notes.filter(|n| !n.trim().is_empty()) {
            let _ = writeln!(out, "Observações: {}", notes);
            out.push('\n');
        }
        out.push_str("Aguardamos confirmação.\n");
        let _ = write!(out, "Att,\nEquipe {}", self.restaurant);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_draft_total_skips_unpriced() {
        let items = vec![line("Alho", "2", Some("12")), line("Sal", "1", None)];
        assert_eq!(draft_total(&items).unwrap(), dec("24"));
    }

    #[test]
    fn test_draft_total_overflow() {
        let huge = "100000000000000000000";
        assert!(draft_total(&[line("Sal", huge, Some(huge))]).is_err());
    }

    #[test]
    fn test_plan_finalize() {
        let plan = plan_finalize(&[line("Alho", "2", Some("12")), line("Sal", "3", Some("2"))]).unwrap();
        assert_eq!(plan.total_value, dec("30"));
        assert_eq!(plan.checklist.len(), plan.items.len());
    }

    #[test]
    fn test_plan_finalize_rejects_missing_price() {
        assert!(plan_finalize(&[line("Alho", "2", Some("12")), line("Sal", "3", None)]).is_err());
        assert!(plan_finalize(&[line("Alho", "2", Some("0"))]).is_err());
    }

    #[test]
    fn test_supplier_message() {
        let (items, total) = price_order_lines(&[line("Alho", "2", Some("12.5"))]).unwrap();
        let message = SupplierMessage {
            restaurant: "Restaurante Central",
            order_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            supplier_name: "Hortifruti Silva",
            order_number: "PED-2026-004",
            expected_delivery: NaiveDate::from_ymd_opt(2026, 3, 7),
            items: &items,
            total_value: total,
            notes: Some("Entregar pela manhã"),
        }
        .render();

        let expected = "Pedido Restaurante Central\n\
Data: 05/03/2026\n\
\n\
Fornecedor: Hortifruti Silva\n\
Número do Pedido: PED-2026-004\n\
Prazo de Entrega: 07/03/2026\n\
\n\
ITENS SOLICITADOS:\n\
• Alho - 2 kg × R$ 12.50 = R$ 25.00\n\
\n\
VALOR TOTAL: R$ 25.00\n\
\n\
Observações: Entregar pela manhã\n\
\n\
Aguardamos confirmação.\n\
Att,\n\
Equipe Restaurante Central";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_supplier_message_without_notes_or_date() {
        let (items, total) = price_order_lines(&[line("Sal", "1", Some("3"))]).unwrap();
        let message = SupplierMessage {
            restaurant: "Cozinha",
            order_date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            supplier_name: "Atacado",
            order_number: "PED-2026-001",
            expected_delivery: None,
            items: &items,
            total_value: total,
            notes: None,
        }
        .render();
        assert!(message.contains("Prazo de Entrega: A combinar\n"));
        assert!(!message.contains("Observações"));
        assert!(message.ends_with("VALOR TOTAL: R$ 3.00\n\nAguardamos confirmação.\nAtt,\nEquipe Cozinha"));
    }
}
