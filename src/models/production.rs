use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Unit;

/// One recipe line of a confirmed production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrderItem {
    pub recipe_id: Uuid,
    /// Produced mass in kg, when known
    #[serde(default)]
    pub produced_mass: Option<f64>,
    /// Produced discrete units, when known
    #[serde(default)]
    pub produced_units: Option<f64>,
    /// Unit the item was produced in
    pub unit: Unit,
}

impl ProductionOrderItem {
    pub fn in_mass(recipe_id: Uuid, kg: f64) -> Self {
        Self {
            recipe_id,
            produced_mass: Some(kg),
            produced_units: None,
            unit: Unit::Mass,
        }
    }

    pub fn in_units(recipe_id: Uuid, units: f64) -> Self {
        Self {
            recipe_id,
            produced_mass: None,
            produced_units: Some(units),
            unit: Unit::Discrete,
        }
    }

    /// Produced quantity expressed in the item's own unit.
    pub fn produced_quantity(&self) -> f64 {
        let value = match self.unit {
            Unit::Discrete => self.produced_units,
            _ => self.produced_mass,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    pub fn positive_mass(&self) -> Option<f64> {
        self.produced_mass.filter(|v| v.is_finite() && *v > 0.0)
    }

    pub fn positive_units(&self) -> Option<f64> {
        self.produced_units.filter(|v| v.is_finite() && *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produced_quantity_follows_unit() {
        let recipe_id = Uuid::new_v4();
        let item = ProductionOrderItem {
            recipe_id,
            produced_mass: Some(12.0),
            produced_units: Some(48.0),
            unit: Unit::Discrete,
        };
        assert_eq!(item.produced_quantity(), 48.0);

        let item = ProductionOrderItem::in_mass(recipe_id, 12.0);
        assert_eq!(item.produced_quantity(), 12.0);
        assert_eq!(item.positive_units(), None);
    }

    #[test]
    fn missing_quantity_is_zero() {
        let item = ProductionOrderItem {
            recipe_id: Uuid::new_v4(),
            produced_mass: None,
            produced_units: None,
            unit: Unit::Mass,
        };
        assert_eq!(item.produced_quantity(), 0.0);
    }
}
