use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::aggregation::{RequirementAggregator, SubRecipeTotals};
use super::catalog::RecipeCatalog;
use crate::models::{
    round_batches, BaseRequirement, Diagnostic, IngredientTarget, OrderLine, SubRecipeSubtotal,
    Unit,
};

/// Output shape of an order-level expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// Fully flattened to base materials
    Flat,
    /// Base materials plus per-sub-recipe subtotals with batch counts
    PreWeighing,
}

/// Un-aggregated result of expanding a single recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub requirements: Vec<BaseRequirement>,
    pub warnings: Vec<Diagnostic>,
    /// Deepest recursion level entered; 0 means only the requested recipe itself
    pub deepest_level: usize,
}

/// Aggregated result of expanding every line of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BomReport {
    pub materials: Vec<BaseRequirement>,
    /// Empty in flat mode
    pub sub_recipes: Vec<SubRecipeSubtotal>,
    pub warnings: Vec<Diagnostic>,
    pub deepest_level: usize,
}

/// Scratch state threaded through one expansion call tree.
#[derive(Default)]
struct Walk {
    requirements: Vec<BaseRequirement>,
    sub_recipes: Option<SubRecipeTotals>,
    warnings: Vec<Diagnostic>,
    deepest_level: usize,
}

impl Walk {
    fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.warnings.push(diagnostic);
    }
}

/// Recursive bill-of-materials expansion over a pre-loaded [`RecipeCatalog`].
///
/// Every failure below the requested recipe is recovered locally: the offending
/// branch contributes nothing and a [`Diagnostic`] explains why.
pub struct BomExpander<'a> {
    catalog: &'a RecipeCatalog,
    max_depth: usize,
}

impl<'a> BomExpander<'a> {
    pub fn new(catalog: &'a RecipeCatalog, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    /// Expands `quantity` of `recipe_id` (in `unit`) into base requirements, one per
    /// base ingredient occurrence. Requirements are not merged.
    pub fn expand(&self, recipe_id: Uuid, quantity: f64, unit: &Unit) -> Expansion {
        counter!("bakery.bom.expansions", 1);

        let mut walk = Walk::default();
        self.walk(recipe_id, quantity, unit, 0, &mut walk);

        Expansion {
            requirements: walk.requirements,
            warnings: walk.warnings,
            deepest_level: walk.deepest_level,
        }
    }

    /// Expands every order line and aggregates the result across lines.
    pub fn expand_order(&self, lines: &[OrderLine], mode: ExpansionMode) -> BomReport {
        counter!("bakery.bom.expansions", 1);

        let mut walk = Walk {
            sub_recipes: matches!(mode, ExpansionMode::PreWeighing).then(SubRecipeTotals::default),
            ..Walk::default()
        };
        for line in lines {
            self.walk(line.recipe_id, line.quantity, &line.unit, 0, &mut walk);
        }

        let mut aggregator = RequirementAggregator::new();
        aggregator.extend(walk.requirements);
        let (materials, aggregation_warnings) = aggregator.finish().into_materials();

        let mut warnings = walk.warnings;
        warnings.extend(aggregation_warnings);

        let sub_recipes = match walk.sub_recipes {
            Some(totals) => {
                let (entries, subtotal_warnings) = totals.into_entries();
                warnings.extend(subtotal_warnings);
                entries
                    .into_iter()
                    .map(|(recipe_id, quantity, unit)| self.subtotal(recipe_id, quantity, unit))
                    .collect()
            }
            None => Vec::new(),
        };

        histogram!("bakery.bom.materials", materials.len() as f64);
        debug!(
            materials = materials.len(),
            sub_recipes = sub_recipes.len(),
            warnings = warnings.len(),
            "order expanded"
        );

        BomReport {
            materials,
            sub_recipes,
            warnings,
            deepest_level: walk.deepest_level,
        }
    }

    fn subtotal(&self, recipe_id: Uuid, quantity: f64, unit: Unit) -> SubRecipeSubtotal {
        let recipe = self.catalog.recipe(recipe_id);
        let batches = recipe
            .and_then(|r| r.yield_for(&unit))
            .map(|reference| round_batches(quantity / reference));
        SubRecipeSubtotal {
            recipe_id,
            name: recipe.map(|r| r.name.clone()).unwrap_or_default(),
            quantity,
            unit,
            batches,
        }
    }

    fn walk(&self, recipe_id: Uuid, quantity: f64, unit: &Unit, depth: usize, walk: &mut Walk) {
        let Some(recipe) = self.catalog.recipe(recipe_id) else {
            walk.diagnose(self.catalog.absence(recipe_id));
            return;
        };

        walk.deepest_level = walk.deepest_level.max(depth);
        if depth > 0 {
            if let Some(totals) = walk.sub_recipes.as_mut() {
                totals.add(recipe_id, quantity, unit);
            }
        }

        if let Unit::Other(raw) = unit {
            walk.diagnose(Diagnostic::UnsupportedUnit {
                recipe_id,
                unit: raw.clone(),
            });
            return;
        }

        let Some(reference) = recipe.yield_for(unit) else {
            walk.diagnose(Diagnostic::InvalidYield {
                recipe_id,
                unit: unit.to_string(),
            });
            return;
        };

        let scale = quantity / reference;
        debug!(%recipe_id, depth, quantity, scale, "expanding recipe");

        for ingredient in self.catalog.ingredients(recipe_id) {
            let scaled = ingredient.quantity * scale;
            match ingredient.target() {
                Some(IngredientTarget::Product(product_id)) => {
                    walk.requirements.push(BaseRequirement::new(
                        product_id,
                        scaled,
                        ingredient.unit.clone(),
                    ));
                }
                Some(IngredientTarget::SubRecipe(nested)) => {
                    if depth + 1 > self.max_depth {
                        walk.diagnose(Diagnostic::DepthLimitReached {
                            recipe_id: nested,
                            depth: depth + 1,
                            max_depth: self.max_depth,
                        });
                        continue;
                    }
                    self.walk(nested, scaled, &ingredient.unit, depth + 1, walk);
                }
                None => walk.diagnose(Diagnostic::MalformedIngredient {
                    recipe_id,
                    ingredient_id: ingredient.id,
                }),
            }
        }
    }
}
