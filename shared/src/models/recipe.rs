//! Recipe ("ficha técnica") costing

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unit_cost;
use crate::error::{DomainError, DomainResult};
use crate::types::{checked_product, checked_total};

/// Category assigned to recipe stubs created from unmapped products
pub const UNCATEGORIZED_RECIPE: &str = "Não categorizado";

/// Ingredient reference submitted when building a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLineInput {
    pub id: Uuid,
    pub quantity: Decimal,
}

/// Pricing facts about an ingredient needed to cost a recipe line
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientCostBasis {
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub net_qty: Decimal,
}

/// A recipe ingredient with its cost resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedLine {
    pub id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

/// Full cost breakdown of a recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeCosting {
    pub ingredients: Vec<CostedLine>,
    pub ingredients_cost: Decimal,
    pub labor_cost: Decimal,
    pub equipment_cost: Decimal,
    pub total_cost: Decimal,
    pub cost_per_portion: Decimal,
}

/// Validate the numeric header of a complete recipe
pub fn validate_recipe_header(portions: i32, suggested_price: Decimal) -> DomainResult<()> {
    if portions <= 0 {
        return Err(DomainError::validation(
            "Número de porções deve ser maior que zero",
        ));
    }
    if suggested_price <= Decimal::ZERO {
        return Err(DomainError::validation(
            "Preço sugerido deve ser maior que zero",
        ));
    }
    Ok(())
}

/// Cost every line against current ingredient prices.
///
/// Lines whose ingredient is unknown are dropped from the result. Costs that
/// overflow the decimal range are rejected.
pub fn cost_recipe(
    lines: &[RecipeLineInput],
    basis: &HashMap<Uuid, IngredientCostBasis>,
    labor_cost: Decimal,
    equipment_cost: Decimal,
    portions: i32,
) -> DomainResult<RecipeCosting> {
    let ingredients = lines
        .iter()
        .filter_map(|line| {
            let ingredient = basis.get(&line.id)?;
            let per_unit = unit_cost(ingredient.price, ingredient.net_qty);
            Some(
                checked_product(per_unit, line.quantity).map(|total_cost| CostedLine {
                    id: line.id,
                    name: ingredient.name.clone(),
                    quantity: line.quantity,
                    unit: ingredient.unit.clone(),
                    unit_cost: per_unit,
                    total_cost,
                }),
            )
        })
        .collect::<DomainResult<Vec<CostedLine>>>()?;

    let ingredients_cost = checked_total(ingredients.iter().map(|l| l.total_cost))?;
    let total_cost = checked_total([ingredients_cost, labor_cost, equipment_cost])?;
    let cost_per_portion = if portions > 0 {
        total_cost / Decimal::from(portions)
    } else {
        Decimal::ZERO
    };

    Ok(RecipeCosting {
        ingredients,
        ingredients_cost,
        labor_cost,
        equipment_cost,
        total_cost,
        cost_per_portion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn basis(name: &str, price: &str, net: &str) -> IngredientCostBasis {
        IngredientCostBasis {
            name: name.to_string(),
            unit: "kg".to_string(),
            price: dec(price),
            net_qty: dec(net),
        }
    }

    #[test]
    fn test_cost_recipe() {
        let rice = Uuid::new_v4();
        let beans = Uuid::new_v4();
        let mut prices = HashMap::new();
        prices.insert(rice, basis("Arroz", "20", "4"));
        prices.insert(beans, basis("Feijão", "30", "3"));

        let lines = vec![
            RecipeLineInput { id: rice, quantity: dec("2") },
            RecipeLineInput { id: beans, quantity: dec("1") },
        ];
        let costing = cost_recipe(&lines, &prices, dec("5"), dec("5"), 4).unwrap();

        // 5/kg * 2 + 10/kg * 1 = 20, plus labor and equipment = 30
        assert_eq!(costing.ingredients_cost, dec("20"));
        assert_eq!(costing.total_cost, dec("30"));
        assert_eq!(costing.cost_per_portion, dec("7.5"));
        assert_eq!(costing.ingredients[0].unit_cost, dec("5"));
    }

    #[test]
    fn test_unknown_ingredients_are_skipped() {
        let lines = vec![RecipeLineInput {
            id: Uuid::new_v4(),
            quantity: dec("2"),
        }];
        let costing = cost_recipe(&lines, &HashMap::new(), Decimal::ZERO, Decimal::ZERO, 2).unwrap();
        assert!(costing.ingredients.is_empty());
        assert_eq!(costing.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let rice = Uuid::new_v4();
        let mut prices = HashMap::new();
        prices.insert(rice, basis("Arroz", "100000000000000000000", "1"));
        let lines = vec![RecipeLineInput {
            id: rice,
            quantity: dec("100000000000000000000"),
        }];
        assert!(cost_recipe(&lines, &prices, Decimal::ZERO, Decimal::ZERO, 1).is_err());
    }

    #[test]
    fn test_header_validation() {
        assert!(validate_recipe_header(1, dec("10")).is_ok());
        assert!(validate_recipe_header(0, dec("10")).is_err());
        assert!(validate_recipe_header(2, Decimal::ZERO).is_err());
    }
}
