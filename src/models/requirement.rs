use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Unit;

/// Quantity of a base product required by an expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRequirement {
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: Unit,
}

impl BaseRequirement {
    pub fn new(product_id: Uuid, quantity: f64, unit: Unit) -> Self {
        Self {
            product_id,
            quantity,
            unit,
        }
    }
}

/// Aggregated amount of one sub-recipe across a whole expansion, with the number
/// of batches it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRecipeSubtotal {
    pub recipe_id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    /// Batches implied by `quantity`, rounded to the nearest hundredth;
    /// `None` when the sub-recipe has no usable yield for `unit`
    pub batches: Option<f64>,
}

/// One `(recipe, quantity, unit)` line of an order, as fed to the expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub recipe_id: Uuid,
    pub quantity: f64,
    pub unit: Unit,
}

impl OrderLine {
    pub fn new(recipe_id: Uuid, quantity: f64, unit: Unit) -> Self {
        Self {
            recipe_id,
            quantity,
            unit,
        }
    }
}

/// Rounds a batch count for reporting (nearest, two decimals).
pub fn round_batches(batches: f64) -> f64 {
    (batches * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_round_to_nearest_hundredth() {
        assert_eq!(round_batches(2.4), 2.4);
        assert_eq!(round_batches(2.404), 2.4);
        assert_eq!(round_batches(2.405_1), 2.41);
        assert_eq!(round_batches(0.333_333), 0.33);
    }
}
