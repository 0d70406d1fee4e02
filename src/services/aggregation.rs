use std::collections::BTreeMap;
use tracing::warn;
use uuid::Uuid;

use crate::models::{BaseRequirement, Diagnostic, Unit};

/// Running `(quantity, unit)` totals keyed by id. Contributions in another unit are
/// summed raw; the unit reported for the total is the lexically smallest one seen,
/// so it does not depend on visiting order.
#[derive(Debug, Default)]
struct Totals {
    entries: BTreeMap<Uuid, (f64, Unit)>,
}

impl Totals {
    /// Adds `quantity` under `id`. On a unit disagreement returns `(kept, other)`.
    fn add(&mut self, id: Uuid, quantity: f64, unit: &Unit) -> Option<(Unit, Unit)> {
        match self.entries.get_mut(&id) {
            Some((total, kept)) => {
                *total += quantity;
                if kept == unit {
                    return None;
                }
                let other = if unit.as_str() < kept.as_str() {
                    std::mem::replace(kept, unit.clone())
                } else {
                    unit.clone()
                };
                Some((kept.clone(), other))
            }
            None => {
                self.entries.insert(id, (quantity, unit.clone()));
                None
            }
        }
    }
}

/// Merges base requirements from every branch of every recipe into one total per product.
#[derive(Debug, Default)]
pub struct RequirementAggregator {
    totals: Totals,
    warnings: Vec<Diagnostic>,
}

impl RequirementAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, requirement: BaseRequirement) {
        if let Some((kept, found)) = self.totals.add(
            requirement.product_id,
            requirement.quantity,
            &requirement.unit,
        ) {
            let diagnostic = Diagnostic::UnitMismatch {
                product_id: requirement.product_id,
                kept: kept.to_string(),
                found: found.to_string(),
            };
            warn!("{}", diagnostic);
            self.warnings.push(diagnostic);
        }
    }

    pub fn extend<I: IntoIterator<Item = BaseRequirement>>(&mut self, requirements: I) {
        for requirement in requirements {
            self.add(requirement);
        }
    }

    /// Totals ordered by product id, plus one `UnitMismatch` per disagreeing contribution.
    pub fn finish(self) -> AggregatedRequirements {
        let totals = self
            .totals
            .entries
            .into_iter()
            .map(|(product_id, (quantity, unit))| {
                (product_id, BaseRequirement::new(product_id, quantity, unit))
            })
            .collect();
        AggregatedRequirements {
            totals,
            warnings: self.warnings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRequirements {
    pub totals: BTreeMap<Uuid, BaseRequirement>,
    pub warnings: Vec<Diagnostic>,
}

impl AggregatedRequirements {
    pub fn into_materials(self) -> (Vec<BaseRequirement>, Vec<Diagnostic>) {
        (self.totals.into_values().collect(), self.warnings)
    }
}

/// Sums a multiset of requirements into a mapping keyed by product id.
pub fn aggregate<I: IntoIterator<Item = BaseRequirement>>(requirements: I) -> AggregatedRequirements {
    let mut aggregator = RequirementAggregator::new();
    aggregator.extend(requirements);
    aggregator.finish()
}

/// Merges repeated appearances of the same sub-recipe (pre-weighing mode).
#[derive(Debug, Default)]
pub(crate) struct SubRecipeTotals {
    totals: Totals,
    order: Vec<Uuid>,
    warnings: Vec<Diagnostic>,
}

impl SubRecipeTotals {
    pub(crate) fn add(&mut self, recipe_id: Uuid, quantity: f64, unit: &Unit) {
        if !self.totals.entries.contains_key(&recipe_id) {
            self.order.push(recipe_id);
        }
        if let Some((kept, found)) = self.totals.add(recipe_id, quantity, unit) {
            let diagnostic = Diagnostic::SubRecipeUnitMismatch {
                recipe_id,
                kept: kept.to_string(),
                found: found.to_string(),
            };
            warn!("{}", diagnostic);
            self.warnings.push(diagnostic);
        }
    }

    /// Entries in first-seen order
    pub(crate) fn into_entries(self) -> (Vec<(Uuid, f64, Unit)>, Vec<Diagnostic>) {
        let mut entries = self.totals.entries;
        let merged = self
            .order
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|(qty, unit)| (id, qty, unit)))
            .collect();
        (merged, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sums_same_product_across_branches() {
        let flour = Uuid::new_v4();
        let yeast = Uuid::new_v4();

        let result = aggregate(vec![
            BaseRequirement::new(flour, 6.0, Unit::Mass),
            BaseRequirement::new(yeast, 0.1, Unit::Mass),
            BaseRequirement::new(flour, 4.5, Unit::Mass),
        ]);

        assert!(result.warnings.is_empty());
        assert_eq!(result.totals.len(), 2);
        assert_eq!(result.totals[&flour].quantity, 10.5);
        assert_eq!(result.totals[&yeast].quantity, 0.1);
    }

    #[test]
    fn unit_mismatch_sums_raw_under_a_stable_unit() {
        let eggs = Uuid::new_v4();

        for requirements in [
            vec![
                BaseRequirement::new(eggs, 2.0, Unit::Discrete),
                BaseRequirement::new(eggs, 0.5, Unit::Mass),
            ],
            vec![
                BaseRequirement::new(eggs, 0.5, Unit::Mass),
                BaseRequirement::new(eggs, 2.0, Unit::Discrete),
            ],
        ] {
            let result = aggregate(requirements);

            let total = &result.totals[&eggs];
            assert_eq!(total.quantity, 2.5);
            assert_eq!(total.unit, Unit::Mass);
            assert_eq!(result.warnings.len(), 1);
            assert_matches!(
                &result.warnings[0],
                Diagnostic::UnitMismatch { product_id, kept, found }
                    if *product_id == eggs && kept == "kg" && found == "un"
            );
        }
    }

    #[test]
    fn sub_recipe_totals_keep_first_seen_order() {
        let dough = Uuid::new_v4();
        let filling = Uuid::new_v4();

        let mut totals = SubRecipeTotals::default();
        totals.add(filling, 1.0, &Unit::Mass);
        totals.add(dough, 2.0, &Unit::Mass);
        totals.add(filling, 0.5, &Unit::Mass);

        let (entries, warnings) = totals.into_entries();
        assert!(warnings.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, filling);
        assert_eq!(entries[0].1, 1.5);
        assert_eq!(entries[1].0, dough);
    }
}
