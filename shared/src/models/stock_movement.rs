//! Append-only stock movement records

use rust_decimal::Decimal;
use uuid::Uuid;

use super::StockIncrement;
use crate::error::DomainResult;
use crate::types::checked_total;

text_enum! {
    pub enum MovementType {
        Receiving => "receiving",
        Adjustment => "adjustment",
        Consumption => "consumption",
        Loss => "loss",
    }
}

text_enum! {
    /// Kind of record that caused a movement
    pub enum ReferenceType {
        Receiving => "receiving",
        InventoryCount => "inventory_count",
        Manual => "manual",
        Sale => "sale",
    }
}

/// A movement about to be appended, paired with a stock write
#[derive(Debug, Clone, PartialEq)]
pub struct NewStockMovement {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub movement_type: MovementType,
    /// Signed change applied to the stock level
    pub quantity: Decimal,
    pub unit: String,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub storage_center: Option<String>,
    /// Why a manual change was made
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

impl NewStockMovement {
    /// Stock arriving from a receiving line
    pub fn receiving(
        increment: &StockIncrement,
        previous_stock: Decimal,
        receiving_id: Uuid,
        created_by: Uuid,
    ) -> DomainResult<Self> {
        let new_stock = checked_total([previous_stock, increment.quantity])?;
        Ok(Self {
            ingredient_id: increment.ingredient_id,
            ingredient_name: increment.ingredient_name.clone(),
            movement_type: MovementType::Receiving,
            quantity: increment.quantity,
            unit: increment.unit.clone(),
            previous_stock,
            new_stock,
            reference_type: ReferenceType::Receiving,
            reference_id: Some(receiving_id),
            storage_center: increment.storage_center.clone(),
            reason: None,
            notes: None,
            created_by: Some(created_by),
        })
    }

    /// Stock set to an absolute level, recording the difference
    #[allow(clippy::too_many_arguments)]
    pub fn adjustment(
        ingredient_id: Uuid,
        ingredient_name: &str,
        unit: &str,
        previous_stock: Decimal,
        new_stock: Decimal,
        reference_type: ReferenceType,
        reference_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            ingredient_id,
            ingredient_name: ingredient_name.to_string(),
            movement_type: MovementType::Adjustment,
            quantity: new_stock - previous_stock,
            unit: unit.to_string(),
            previous_stock,
            new_stock,
            reference_type,
            reference_id,
            storage_center: None,
            reason: None,
            notes: None,
            created_by,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_storage_center(mut self, storage_center: Option<String>) -> Self {
        self.storage_center = storage_center;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiving_movement_adds_quantity() {
        let increment = StockIncrement {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Leite".to_string(),
            quantity: Decimal::from(6),
            unit: "l".to_string(),
            storage_center: Some("camara-fria".to_string()),
            expiry_date: None,
        };
        let movement =
            NewStockMovement::receiving(&increment, Decimal::from(4), Uuid::new_v4(), Uuid::new_v4())
                .unwrap();
        assert_eq!(movement.new_stock, Decimal::from(10));
        assert_eq!(movement.movement_type, MovementType::Receiving);
        assert_eq!(movement.reference_type, ReferenceType::Receiving);
    }

    #[test]
    fn test_receiving_movement_rejects_overflow() {
        let increment = StockIncrement {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: "Leite".to_string(),
            quantity: Decimal::MAX,
            unit: "l".to_string(),
            storage_center: None,
            expiry_date: None,
        };
        assert!(
            NewStockMovement::receiving(&increment, Decimal::ONE, Uuid::new_v4(), Uuid::new_v4())
                .is_err()
        );
    }

    #[test]
    fn test_adjustment_records_signed_difference() {
        let movement = NewStockMovement::adjustment(
            Uuid::new_v4(),
            "Farinha",
            "kg",
            Decimal::from(10),
            Decimal::from(7),
            ReferenceType::Manual,
            None,
            None,
        );
        assert_eq!(movement.quantity, Decimal::from(-3));
    }

    #[test]
    fn test_reference_type_text() {
        assert_eq!(ReferenceType::InventoryCount.as_str(), "inventory_count");
        assert_eq!("sale".parse::<ReferenceType>(), Ok(ReferenceType::Sale));
    }
}
