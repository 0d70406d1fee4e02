use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{Diagnostic, Ingredient, IngredientTarget, Recipe},
    repositories::RecipeRepository,
};

/// Per-tenant adjacency of recipes to their ingredient rows.
///
/// Built once per request through the repository so that expansion itself runs
/// synchronously over owned data. Recipes from other tenants never enter the
/// catalog and are indistinguishable from missing ones.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: HashMap<Uuid, Recipe>,
    ingredients: HashMap<Uuid, Vec<Ingredient>>,
    unreadable: HashMap<Uuid, String>,
}

impl RecipeCatalog {
    /// Walks the sub-recipe graph breadth-first from `roots`, fetching every recipe
    /// and its ingredient rows at most once, never further than `max_depth` levels
    /// below a root.
    ///
    /// Only connectivity failures are returned. A recipe whose rows fail to load is
    /// left out of the catalog and remembered as unreadable.
    #[instrument(skip(repo, roots), fields(roots = roots.len()))]
    pub async fn load(
        repo: &dyn RecipeRepository,
        tenant_id: Uuid,
        roots: &[Uuid],
        max_depth: usize,
    ) -> Result<Self, ServiceError> {
        let mut catalog = Self::default();
        let mut queue: VecDeque<(Uuid, usize)> = roots.iter().map(|id| (*id, 0)).collect();
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut missing = 0usize;

        while let Some((recipe_id, level)) = queue.pop_front() {
            if !seen.insert(recipe_id) {
                continue;
            }

            let recipe = match repo.get_recipe(tenant_id, recipe_id).await {
                Ok(Some(recipe)) => recipe,
                Ok(None) => {
                    debug!(%recipe_id, "recipe not found while loading catalog");
                    missing += 1;
                    continue;
                }
                Err(e) => {
                    catalog.skip_unreadable(recipe_id, e)?;
                    continue;
                }
            };
            let rows = match repo.get_ingredients(tenant_id, recipe_id).await {
                Ok(rows) => rows,
                Err(e) => {
                    catalog.skip_unreadable(recipe_id, e)?;
                    continue;
                }
            };

            if level < max_depth {
                for row in &rows {
                    if let Some(IngredientTarget::SubRecipe(nested)) = row.target() {
                        if !seen.contains(&nested) {
                            queue.push_back((nested, level + 1));
                        }
                    }
                }
            }

            catalog.ingredients.insert(recipe_id, rows);
            catalog.recipes.insert(recipe_id, recipe);
        }

        info!(
            loaded = catalog.recipes.len(),
            missing,
            unreadable = catalog.unreadable.len(),
            "recipe catalog loaded"
        );
        Ok(catalog)
    }

    fn skip_unreadable(&mut self, recipe_id: Uuid, err: ServiceError) -> Result<(), ServiceError> {
        if err.is_connectivity() {
            return Err(err);
        }
        warn!(%recipe_id, "recipe could not be read: {}", err);
        self.unreadable.insert(recipe_id, err.to_string());
        Ok(())
    }

    /// Builds a catalog from data already in hand. Recipes owned by another tenant are dropped.
    pub fn from_parts(tenant_id: Uuid, entries: Vec<(Recipe, Vec<Ingredient>)>) -> Self {
        let mut catalog = Self::default();
        for (recipe, rows) in entries {
            if recipe.tenant_id != tenant_id {
                continue;
            }
            catalog.ingredients.insert(recipe.id, rows);
            catalog.recipes.insert(recipe.id, recipe);
        }
        catalog
    }

    pub fn recipe(&self, recipe_id: Uuid) -> Option<&Recipe> {
        self.recipes.get(&recipe_id)
    }

    pub fn ingredients(&self, recipe_id: Uuid) -> &[Ingredient] {
        self.ingredients
            .get(&recipe_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Why the repository failed to produce this recipe, if it did
    fn unreadable(&self, recipe_id: Uuid) -> Option<&str> {
        self.unreadable.get(&recipe_id).map(String::as_str)
    }

    /// Diagnostic for a recipe that is not in the catalog
    pub fn absence(&self, recipe_id: Uuid) -> Diagnostic {
        match self.unreadable(recipe_id) {
            Some(reason) => Diagnostic::RecipeUnreadable {
                recipe_id,
                reason: reason.to_string(),
            },
            None => Diagnostic::RecipeNotFound { recipe_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use crate::repositories::InMemoryRecipeRepository;
    use assert_matches::assert_matches;

    fn recipe(tenant_id: Uuid, name: &str) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            yield_mass: Some(1.0),
            yield_units: None,
            product_id: None,
        }
    }

    #[tokio::test]
    async fn load_fetches_each_recipe_once() {
        let tenant = Uuid::new_v4();
        let shared = recipe(tenant, "Massa Base");
        let a = recipe(tenant, "Pão Francês");
        let b = recipe(tenant, "Baguete");

        let repo = InMemoryRecipeRepository::new()
            .with_recipe(shared.clone(), vec![])
            .with_recipe(
                a.clone(),
                vec![Ingredient::sub_recipe(a.id, shared.id, 1.0, Unit::Mass)],
            )
            .with_recipe(
                b.clone(),
                vec![Ingredient::sub_recipe(b.id, shared.id, 2.0, Unit::Mass)],
            );

        let catalog = RecipeCatalog::load(&repo, tenant, &[a.id, b.id, a.id], 8)
            .await
            .unwrap();

        assert_eq!(repo.recipe_reads(), 3);
        assert!(catalog.recipe(shared.id).is_some());
        assert_eq!(catalog.ingredients(a.id).len(), 1);
        assert!(catalog.ingredients(shared.id).is_empty());
    }

    #[tokio::test]
    async fn load_stops_at_max_depth() {
        let tenant = Uuid::new_v4();
        let leaf = recipe(tenant, "Recheio");
        let middle = recipe(tenant, "Massa");
        let root = recipe(tenant, "Torta");
        let ghost = Uuid::new_v4();

        let repo = InMemoryRecipeRepository::new()
            .with_recipe(leaf.clone(), vec![])
            .with_recipe(
                middle.clone(),
                vec![Ingredient::sub_recipe(middle.id, leaf.id, 1.0, Unit::Mass)],
            )
            .with_recipe(
                root.clone(),
                vec![Ingredient::sub_recipe(root.id, middle.id, 1.0, Unit::Mass)],
            );

        let catalog = RecipeCatalog::load(&repo, tenant, &[root.id, ghost], 1)
            .await
            .unwrap();

        assert!(catalog.recipe(root.id).is_some());
        assert!(catalog.recipe(middle.id).is_some());
        assert!(catalog.recipe(leaf.id).is_none());
        assert!(catalog.recipe(ghost).is_none());
        assert!(catalog.unreadable(ghost).is_none());
    }

    #[test]
    fn from_parts_drops_foreign_recipes() {
        let tenant = Uuid::new_v4();
        let own = recipe(tenant, "Broa");
        let foreign = recipe(Uuid::new_v4(), "Broa");

        let catalog =
            RecipeCatalog::from_parts(tenant, vec![(own.clone(), vec![]), (foreign.clone(), vec![])]);

        assert!(catalog.recipe(own.id).is_some());
        assert!(catalog.recipe(foreign.id).is_none());
    }

    #[tokio::test]
    async fn unreadable_sub_recipe_is_skipped() {
        let tenant = Uuid::new_v4();
        let massa = recipe(tenant, "Massa Base");
        let pao = recipe(tenant, "Pão Francês");
        let repo = InMemoryRecipeRepository::new()
            .with_recipe(massa.clone(), vec![])
            .with_recipe(
                pao.clone(),
                vec![Ingredient::sub_recipe(pao.id, massa.id, 1.0, Unit::Mass)],
            )
            .with_unreadable(massa.id, "invalid value for column yield_mass_kg");

        let catalog = RecipeCatalog::load(&repo, tenant, &[pao.id], 8).await.unwrap();

        assert!(catalog.recipe(pao.id).is_some());
        assert!(catalog.recipe(massa.id).is_none());
        assert!(catalog
            .unreadable(massa.id)
            .is_some_and(|reason| reason.contains("yield_mass_kg")));
    }

    #[tokio::test]
    async fn connectivity_failure_aborts_the_load() {
        let tenant = Uuid::new_v4();
        let pao = recipe(tenant, "Pão Francês");
        let repo = InMemoryRecipeRepository::new().with_recipe(pao.clone(), vec![]);
        repo.set_unavailable(true);

        let err = RecipeCatalog::load(&repo, tenant, &[pao.id], 8)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::ServiceUnavailable(_));
    }
}
