//! Goods receiving checklists and their reconciliation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PurchaseItem, PurchaseStatus};
use crate::error::{DomainError, DomainResult};
use crate::types::{checked_product, checked_total, AMOUNT_OVERFLOW};

text_enum! {
    pub enum ReceivingStatus {
        AwaitingDelivery => "awaiting_delivery",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl ReceivingStatus {
    /// Completed and cancelled receivings no longer accept changes
    pub fn is_closed(&self) -> bool {
        matches!(self, ReceivingStatus::Completed | ReceivingStatus::Cancelled)
    }
}

/// One expected line of a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub ordered_qty: Decimal,
    pub received_qty: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub is_checked: bool,
    pub is_received: bool,
    #[serde(default)]
    pub missing_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub storage_center: Option<String>,
    #[serde(default)]
    pub checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checked_by: Option<Uuid>,
}

/// Build a fresh checklist with one unchecked line per purchase item
pub fn build_checklist(items: &[PurchaseItem]) -> Vec<ChecklistItem> {
    items
        .iter()
        .map(|item| ChecklistItem {
            ingredient_id: item.ingredient_id,
            ingredient_name: item.ingredient_name.clone(),
            ordered_qty: item.quantity,
            received_qty: Decimal::ZERO,
            unit: item.unit.clone(),
            unit_price: item.unit_price,
            is_checked: false,
            is_received: false,
            missing_reason: None,
            notes: None,
            expiry_date: None,
            batch_number: None,
            storage_center: None,
            checked_at: None,
            checked_by: None,
        })
        .collect()
}

/// What the person at the dock recorded for a single line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistUpdate {
    pub is_received: bool,
    #[serde(default)]
    pub received_qty: Option<Decimal>,
    #[serde(default)]
    pub missing_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub storage_center: Option<String>,
}

/// Received value and the shortfall against what was ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceivingTotals {
    pub received_total_value: Decimal,
    pub adjustment_value: Decimal,
}

pub fn receiving_totals(
    checklist: &[ChecklistItem],
    ordered_total: Decimal,
) -> DomainResult<ReceivingTotals> {
    let received_total_value = checked_total(
        checklist
            .iter()
            .map(|item| checked_product(item.received_qty, item.unit_price))
            .collect::<DomainResult<Vec<_>>>()?,
    )?;
    let adjustment_value = ordered_total
        .checked_sub(received_total_value)
        .ok_or_else(|| DomainError::validation(AMOUNT_OVERFLOW))?;
    Ok(ReceivingTotals {
        received_total_value,
        adjustment_value,
    })
}

/// Record a check on line `index`.
///
/// Lines marked as not received keep a zero quantity whatever was sent.
pub fn apply_checklist_update(
    status: ReceivingStatus,
    checklist: &mut [ChecklistItem],
    index: usize,
    update: ChecklistUpdate,
    checked_by: Uuid,
    checked_at: DateTime<Utc>,
) -> DomainResult<()> {
    if status.is_closed() {
        return Err(DomainError::invalid_state(
            "Recebimento já finalizado não pode ser alterado",
        ));
    }
    let item = checklist
        .get_mut(index)
        .ok_or_else(|| DomainError::validation("Item do checklist inválido"))?;

    let received_qty = if update.is_received {
        update.received_qty.unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    if received_qty < Decimal::ZERO {
        return Err(DomainError::validation(
            "Quantidade recebida não pode ser negativa",
        ));
    }

    item.received_qty = received_qty;
    item.is_checked = true;
    item.is_received = update.is_received;
    item.missing_reason = update.missing_reason;
    item.notes = update.notes;
    item.expiry_date = update.expiry_date;
    item.batch_number = update.batch_number;
    item.storage_center = update.storage_center;
    item.checked_at = Some(checked_at);
    item.checked_by = Some(checked_by);

    Ok(())
}

/// Stock to add for one received line
#[derive(Debug, Clone, PartialEq)]
pub struct StockIncrement {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub storage_center: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Everything completing a receiving must write
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPlan {
    pub increments: Vec<StockIncrement>,
    /// New purchase status, or `None` to leave it as is
    pub purchase_status: Option<PurchaseStatus>,
}

/// Purchase status implied by a fully checked delivery.
///
/// Received when every line arrived in full, partial when anything arrived.
pub fn derive_purchase_status(checklist: &[ChecklistItem]) -> Option<PurchaseStatus> {
    let complete = !checklist.is_empty()
        && checklist
            .iter()
            .all(|i| i.is_received && i.received_qty >= i.ordered_qty);
    if complete {
        Some(PurchaseStatus::Received)
    } else if checklist.iter().any(|i| i.is_received) {
        Some(PurchaseStatus::Partial)
    } else {
        None
    }
}

/// Validate a receiving can be completed and derive its stock effects
pub fn plan_completion(
    status: ReceivingStatus,
    has_invoice_photo: bool,
    checklist: &[ChecklistItem],
) -> DomainResult<CompletionPlan> {
    if status.is_closed() {
        return Err(DomainError::invalid_state(
            "Recebimento já foi finalizado ou cancelado",
        ));
    }
    if !has_invoice_photo {
        return Err(DomainError::validation("Foto da nota fiscal é obrigatória"));
    }
    if checklist.iter().any(|i| !i.is_checked) {
        return Err(DomainError::validation(
            "Todos os itens devem ser conferidos antes de completar o recebimento",
        ));
    }

    let increments = checklist
        .iter()
        .filter(|i| i.is_received && i.received_qty > Decimal::ZERO)
        .map(|i| StockIncrement {
            ingredient_id: i.ingredient_id,
            ingredient_name: i.ingredient_name.clone(),
            quantity: i.received_qty,
            unit: i.unit.clone(),
            storage_center: i.storage_center.clone(),
            expiry_date: i.expiry_date,
        })
        .collect();

    Ok(CompletionPlan {
        increments,
        purchase_status: derive_purchase_status(checklist),
    })
}

/// Largest invoice photo accepted, in bytes
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Validate an invoice photo and return the file extension to store it under
pub fn validate_invoice_photo(content_type: &str, size: usize) -> DomainResult<&'static str> {
    let ext = match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => {
            return Err(DomainError::validation(
                "Formato de imagem inválido. Envie JPEG, PNG ou WEBP",
            ))
        }
    };
    if size == 0 {
        return Err(DomainError::validation("Arquivo de imagem vazio"));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(DomainError::validation("Arquivo muito grande (máximo 10MB)"));
    }
    Ok(ext)
}

/// Object key for an invoice photo
pub fn invoice_photo_key(receiving_id: Uuid, uploaded_at: DateTime<Utc>, ext: &str) -> String {
    format!(
        "receipt-photos/{id}/{id}-{ts}.{ext}",
        id = receiving_id,
        ts = uploaded_at.timestamp_millis(),
        ext = ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn purchase_item(qty: &str, price: &str) -> PurchaseItem {
        PurchaseItem {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Cebola".to_string(),
            quantity: dec(qty),
            unit: "kg".to_string(),
            unit_price: dec(price),
            total_price: dec(qty) * dec(price),
        }
    }

    fn received(qty: &str) -> ChecklistUpdate {
        ChecklistUpdate {
            is_received: true,
            received_qty: Some(dec(qty)),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_checklist_is_zeroed() {
        let checklist = build_checklist(&[purchase_item("5", "2"), purchase_item("1", "9")]);
        assert_eq!(checklist.len(), 2);
        assert!(checklist.iter().all(|i| !i.is_checked && !i.is_received));
        assert!(checklist.iter().all(|i| i.received_qty.is_zero()));
        assert_eq!(checklist[0].ordered_qty, dec("5"));
    }

    #[test]
    fn test_update_out_of_range() {
        let mut checklist = build_checklist(&[purchase_item("5", "2")]);
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
    fn test_not_received_zeroes_quantity() {
        let mut checklist = build_checklist(&[purchase_item("5", "2")]);
        let update = ChecklistUpdate {
            is_received: false,
            received_qty: Some(dec("4")),
            missing_reason: Some("Fora de estoque".to_string()),
            ..Default::default()
        };
        apply_checklist_update(
            ReceivingStatus::InProgress,
            &mut checklist,
            0,
            update,
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap();
        assert!(checklist[0].is_checked);
        assert!(!checklist[0].is_received);
        assert!(checklist[0].received_qty.is_zero());
    }

    #[test]
    fn test_closed_receiving_rejects_update() {
        let mut checklist = build_checklist(&[purchase_item("5", "2")]);
        assert!(apply_checklist_update(
            ReceivingStatus::Completed,
            &mut checklist,
            0,
            received("5"),
            Uuid::new_v4(),
            Utc::now(),
        )
        .is_err());
    }

    #[test]
    fn test_totals() {
        let mut checklist = build_checklist(&[purchase_item("5", "2"), purchase_item("2", "10")]);
        let user = Uuid::new_v4();
        apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, 0, received("4"), user, Utc::now()).unwrap();
        let totals = receiving_totals(&checklist, dec("30")).unwrap();
        assert_eq!(totals.received_total_value, dec("8"));
        assert_eq!(totals.adjustment_value, dec("22"));
    }

    #[test]
    fn test_completion_requires_photo() {
        let checklist = build_checklist(&[purchase_item("5", "2")]);
        let err = plan_completion(ReceivingStatus::InProgress, false, &checklist).unwrap_err();
        assert_eq!(err.to_string(), "Foto da nota fiscal é obrigatória");
    }

    #[test]
    fn test_completion_requires_all_checked() {
        let checklist = build_checklist(&[purchase_item("5", "2")]);
        let err = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Todos os itens devem ser conferidos antes de completar o recebimento"
        );
    }

    #[test]
    fn test_completion_plan() {
        let mut checklist = build_checklist(&[
            purchase_item("5", "2"),
            purchase_item("2", "10"),
            purchase_item("1", "3"),
        ]);
        let user = Uuid::new_v4();
        let now = Utc::now();
        apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, 0, received("5"), user, now).unwrap();
        apply_checklist_update(ReceivingStatus::InProgress, &mut checklist, 1, received("1"), user, now).unwrap();
        apply_checklist_update(
            ReceivingStatus::InProgress,
            &mut checklist,
            2,
            ChecklistUpdate::default(),
            user,
            now,
        )
        .unwrap();

        let plan = plan_completion(ReceivingStatus::InProgress, true, &checklist).unwrap();
        assert_eq!(plan.increments.len(), 2);
        assert_eq!(plan.increments[1].quantity, dec("1"));
        assert_eq!(plan.purchase_status, Some(PurchaseStatus::Partial));
    }

    #[test]
    fn test_invoice_photo_rules() {
        assert_eq!(validate_invoice_photo("image/png", 1024), Ok("png"));
        assert_eq!(validate_invoice_photo("image/jpeg", 1024), Ok("jpg"));
        assert!(validate_invoice_photo("application/pdf", 1024).is_err());
        assert!(validate_invoice_photo("image/webp", MAX_PHOTO_BYTES + 1).is_err());
        assert!(validate_invoice_photo("image/webp", 0).is_err());
    }

    #[test]
    fn test_invoice_photo_key() {
        let id = Uuid::nil();
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            invoice_photo_key(id, at, "jpg"),
            format!("receipt-photos/{id}/{id}-1700000000000.jpg")
        );
    }

    #[test]
    fn test_purchase_status_derivation() {
        let mut checklist = build_checklist(&[purchase_item("5", "2")]);
        assert_eq!(derive_purchase_status(&checklist), None);

        checklist[0].is_checked = true;
        checklist[0].is_received = true;
        checklist[0].received_qty = dec("5");
        assert_eq!(derive_purchase_status(&checklist), Some(PurchaseStatus::Received));

        checklist[0].received_qty = dec("4");
        assert_eq!(derive_purchase_status(&checklist), Some(PurchaseStatus::Partial));
    }
}
