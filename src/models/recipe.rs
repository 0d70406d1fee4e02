use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Unit;

/// A recipe and its yield references. Ingredient rows are held separately
/// (see `services::catalog::RecipeCatalog`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// Mass produced by one full batch, in kg
    pub yield_mass: Option<f64>,
    /// Discrete units produced by one full batch
    pub yield_units: Option<f64>,
    /// Finished-good product credited when this recipe is produced
    pub product_id: Option<Uuid>,
}

impl Recipe {
    /// Yield used as the scaling reference for `unit`.
    ///
    /// Returns `None` when the matching yield is missing, zero, negative or not finite,
    /// or when `unit` is neither mass nor discrete.
    pub fn yield_for(&self, unit: &Unit) -> Option<f64> {
        let raw = match unit {
            Unit::Mass => self.yield_mass,
            Unit::Discrete => self.yield_units,
            Unit::Other(_) => None,
        };
        raw.filter(|value| value.is_finite() && *value > 0.0)
    }

    /// Mass of one discrete unit, when both yields are usable.
    pub fn mass_per_unit(&self) -> Option<f64> {
        let mass = self.yield_for(&Unit::Mass)?;
        let units = self.yield_for(&Unit::Discrete)?;
        Some(mass / units)
    }
}

/// One ingredient row of a recipe, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub quantity: f64,
    pub unit: Unit,
    pub is_sub_recipe: bool,
    pub product_id: Option<Uuid>,
    pub sub_recipe_id: Option<Uuid>,
}

/// What an ingredient row points at once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientTarget {
    /// Raw material, terminal node
    Product(Uuid),
    /// Nested recipe, expanded recursively
    SubRecipe(Uuid),
}

impl Ingredient {
    pub fn base(recipe_id: Uuid, product_id: Uuid, quantity: f64, unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            quantity,
            unit,
            is_sub_recipe: false,
            product_id: Some(product_id),
            sub_recipe_id: None,
        }
    }

    pub fn sub_recipe(recipe_id: Uuid, sub_recipe_id: Uuid, quantity: f64, unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            quantity,
            unit,
            is_sub_recipe: true,
            product_id: None,
            sub_recipe_id: Some(sub_recipe_id),
        }
    }

    /// Resolves the row to a target, or `None` for a malformed row: the tag disagrees
    /// with the populated reference, both or neither reference is set, or the quantity
    /// is not a positive finite number.
    pub fn target(&self) -> Option<IngredientTarget> {
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return None;
        }
        match (self.is_sub_recipe, self.product_id, self.sub_recipe_id) {
            (false, Some(product_id), None) => Some(IngredientTarget::Product(product_id)),
            (true, None, Some(sub_recipe_id)) => Some(IngredientTarget::SubRecipe(sub_recipe_id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(yield_mass: Option<f64>, yield_units: Option<f64>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Baguete".into(),
            yield_mass,
            yield_units,
            product_id: None,
        }
    }

    #[test]
    fn yield_for_picks_reference_by_unit() {
        let r = recipe(Some(10.0), Some(40.0));
        assert_eq!(r.yield_for(&Unit::Mass), Some(10.0));
        assert_eq!(r.yield_for(&Unit::Discrete), Some(40.0));
        assert_eq!(r.yield_for(&Unit::parse("g")), None);
        assert_eq!(r.mass_per_unit(), Some(0.25));
    }

    #[test]
    fn unusable_yields_are_none() {
        assert_eq!(recipe(Some(0.0), None).yield_for(&Unit::Mass), None);
        assert_eq!(recipe(None, None).yield_for(&Unit::Mass), None);
        assert_eq!(recipe(Some(f64::NAN), None).yield_for(&Unit::Mass), None);
        assert_eq!(recipe(Some(-2.0), None).yield_for(&Unit::Mass), None);
        assert_eq!(recipe(Some(5.0), None).mass_per_unit(), None);
    }

    #[test]
    fn ingredient_target_requires_consistent_tagging() {
        let recipe_id = Uuid::new_v4();
        let product = Uuid::new_v4();
        let nested = Uuid::new_v4();

        let base = Ingredient::base(recipe_id, product, 1.0, Unit::Mass);
        assert_eq!(base.target(), Some(IngredientTarget::Product(product)));

        let sub = Ingredient::sub_recipe(recipe_id, nested, 1.0, Unit::Mass);
        assert_eq!(sub.target(), Some(IngredientTarget::SubRecipe(nested)));

        let mut both = base.clone();
        both.sub_recipe_id = Some(nested);
        assert_eq!(both.target(), None);

        let mut neither = base.clone();
        neither.product_id = None;
        assert_eq!(neither.target(), None);

        let mut mislabeled = base.clone();
        mislabeled.is_sub_recipe = true;
        assert_eq!(mislabeled.target(), None);

        let mut zero = base;
        zero.quantity = 0.0;
        assert_eq!(zero.target(), None);
    }
}
