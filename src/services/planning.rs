use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::bom::{BomExpander, BomReport, ExpansionMode};
use super::catalog::RecipeCatalog;
use crate::{
    errors::ServiceError,
    models::{BaseRequirement, Diagnostic, OrderLine, SubRecipeSubtotal, Unit},
    repositories::RecipeRepository,
};

/// One base material of a materials list, named for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialLine {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialsList {
    pub materials: Vec<MaterialLine>,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreWeighingList {
    pub sub_recipes: Vec<SubRecipeSubtotal>,
    pub materials: Vec<MaterialLine>,
    pub warnings: Vec<Diagnostic>,
}

/// Read path: what an order needs, before anything is produced.
#[derive(Clone)]
pub struct ProductionPlanningService {
    recipes: Arc<dyn RecipeRepository>,
    max_depth: usize,
}

impl ProductionPlanningService {
    pub fn new(recipes: Arc<dyn RecipeRepository>, max_depth: usize) -> Self {
        Self { recipes, max_depth }
    }

    /// Flattened, aggregated base materials for every line of an order
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn materials_list(
        &self,
        tenant_id: Uuid,
        lines: &[OrderLine],
    ) -> Result<MaterialsList, ServiceError> {
        let report = self.report(tenant_id, lines, ExpansionMode::Flat).await?;
        let materials = self.name_materials(tenant_id, report.materials).await?;

        info!(
            materials = materials.len(),
            warnings = report.warnings.len(),
            "materials list computed"
        );
        Ok(MaterialsList {
            materials,
            warnings: report.warnings,
        })
    }

    /// Sub-recipe batch subtotals plus the flattened materials
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn pre_weighing_list(
        &self,
        tenant_id: Uuid,
        lines: &[OrderLine],
    ) -> Result<PreWeighingList, ServiceError> {
        let report = self
            .report(tenant_id, lines, ExpansionMode::PreWeighing)
            .await?;
        let materials = self.name_materials(tenant_id, report.materials).await?;

        info!(
            sub_recipes = report.sub_recipes.len(),
            materials = materials.len(),
            warnings = report.warnings.len(),
            "pre-weighing list computed"
        );
        Ok(PreWeighingList {
            sub_recipes: report.sub_recipes,
            materials,
            warnings: report.warnings,
        })
    }

    async fn report(
        &self,
        tenant_id: Uuid,
        lines: &[OrderLine],
        mode: ExpansionMode,
    ) -> Result<BomReport, ServiceError> {
        validate_lines(lines)?;

        let roots: Vec<Uuid> = lines.iter().map(|line| line.recipe_id).collect();
        let catalog =
            RecipeCatalog::load(self.recipes.as_ref(), tenant_id, &roots, self.max_depth).await?;

        Ok(BomExpander::new(&catalog, self.max_depth).expand_order(lines, mode))
    }

    async fn name_materials(
        &self,
        tenant_id: Uuid,
        materials: Vec<BaseRequirement>,
    ) -> Result<Vec<MaterialLine>, ServiceError> {
        let ids = materials.iter().map(|m| m.product_id).collect();
        let mut names: HashMap<Uuid, String> =
            match self.recipes.get_product_names(tenant_id, ids).await {
                Ok(names) => names,
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    warn!("product names unavailable, listing ids only: {}", e);
                    HashMap::new()
                }
            };

        Ok(materials
            .into_iter()
            .map(|m| MaterialLine {
                product_name: names.remove(&m.product_id),
                product_id: m.product_id,
                quantity: m.quantity,
                unit: m.unit,
            })
            .collect())
    }
}

fn validate_lines(lines: &[OrderLine]) -> Result<(), ServiceError> {
    for line in lines {
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(ServiceError::InvalidInput(format!(
                "quantity for recipe {} must be a positive number, got {}",
                line.recipe_id, line.quantity
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, Recipe};
    use crate::repositories::InMemoryRecipeRepository;
    use assert_matches::assert_matches;

    fn service() -> (ProductionPlanningService, Uuid, Uuid, Uuid) {
        let tenant = Uuid::new_v4();
        let acucar = Uuid::new_v4();
        let bolo = Recipe {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: "Bolo".into(),
            yield_mass: Some(2.0),
            yield_units: None,
            product_id: None,
        };
        let repo = InMemoryRecipeRepository::new()
            .with_recipe(
                bolo.clone(),
                vec![Ingredient::base(bolo.id, acucar, 0.5, Unit::Mass)],
            )
            .with_product(tenant, acucar, "Açúcar");

        (
            ProductionPlanningService::new(Arc::new(repo), 8),
            tenant,
            bolo.id,
            acucar,
        )
    }

    #[tokio::test]
    async fn materials_list_names_products() {
        let (service, tenant, bolo, acucar) = service();
        let list = service
            .materials_list(tenant, &[OrderLine::new(bolo, 4.0, Unit::Mass)])
            .await
            .unwrap();

        assert_eq!(
            list.materials,
            vec![MaterialLine {
                product_id: acucar,
                product_name: Some("Açúcar".into()),
                quantity: 1.0,
                unit: Unit::Mass,
            }]
        );
        assert!(list.warnings.is_empty());
    }

    #[tokio::test]
    async fn other_tenant_sees_nothing() {
        let (service, _, bolo, _) = service();
        let list = service
            .materials_list(Uuid::new_v4(), &[OrderLine::new(bolo, 4.0, Unit::Mass)])
            .await
            .unwrap();

        assert!(list.materials.is_empty());
        assert_matches!(list.warnings.as_slice(), [Diagnostic::RecipeNotFound { .. }]);
    }

    #[tokio::test]
    async fn rejects_non_positive_quantities() {
        let (service, tenant, bolo, _) = service();
        let err = service
            .pre_weighing_list(tenant, &[OrderLine::new(bolo, 0.0, Unit::Mass)])
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::InvalidInput(_));
    }

    #[tokio::test]
    async fn unreadable_sub_recipe_keeps_the_rest_of_the_list() {
        let tenant = Uuid::new_v4();
        let farinha = Uuid::new_v4();
        let recipe = |name: &str, yield_mass: f64| Recipe {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name: name.into(),
            yield_mass: Some(yield_mass),
            yield_units: None,
            product_id: None,
        };
        let massa = recipe("Massa Base", 2.0);
        let pao = recipe("Pão Francês", 10.0);
        let repo = InMemoryRecipeRepository::new()
            .with_recipe(massa.clone(), vec![])
            .with_recipe(
                pao.clone(),
                vec![
                    Ingredient::base(pao.id, farinha, 6.0, Unit::Mass),
                    Ingredient::sub_recipe(pao.id, massa.id, 4.0, Unit::Mass),
                ],
            )
            .with_product(tenant, farinha, "Farinha")
            .with_unreadable(massa.id, "invalid value for column yield_mass_kg");
        let service = ProductionPlanningService::new(Arc::new(repo), 8);

        let list = service
            .materials_list(tenant, &[OrderLine::new(pao.id, 20.0, Unit::Mass)])
            .await
            .unwrap();

        assert_eq!(list.materials.len(), 1);
        assert_eq!(list.materials[0].product_name.as_deref(), Some("Farinha"));
        assert_eq!(list.materials[0].quantity, 12.0);
        assert_matches!(
            list.warnings.as_slice(),
            [Diagnostic::RecipeUnreadable { recipe_id, reason }]
                if *recipe_id == massa.id && reason.contains("yield_mass_kg")
        );
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_list() {
        let (service, tenant, bolo, _) = service();
        let repo = InMemoryRecipeRepository::new();
        repo.set_unavailable(true);
        let offline = ProductionPlanningService::new(Arc::new(repo), 8);

        let err = offline
            .materials_list(tenant, &[OrderLine::new(bolo, 1.0, Unit::Mass)])
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ServiceUnavailable(_));

        assert!(service
            .materials_list(tenant, &[OrderLine::new(bolo, 1.0, Unit::Mass)])
            .await
            .is_ok());
    }
}
