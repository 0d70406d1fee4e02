use chrono::{NaiveDate, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{AsRefStr, Display};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::aggregation::aggregate;
use super::bom::BomExpander;
use super::catalog::RecipeCatalog;
use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        Diagnostic, Direction, NewInventoryTransaction, ProductionOrderItem, Recipe, Unit,
        REASON_PRODUCTION, REASON_PRODUCTION_CONSUMPTION,
    },
    repositories::{InventorySink, RecipeRepository, SinkError},
};

/// Order-level state once the engine has run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderAdjustmentStatus {
    /// Every attempted posting was accepted
    Completed,
    /// At least one posting was rejected; accepted ones stay in place
    PartiallyApplied,
}

/// Result of one attempted posting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingOutcome {
    pub product_id: Uuid,
    pub direction: Direction,
    pub quantity: f64,
    pub unit: Unit,
    pub new_stock: Option<f64>,
    pub error: Option<String>,
}

impl PostingOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub recipe_id: Uuid,
    /// False when any posting for this item was rejected
    pub ok: bool,
    pub credit: Option<PostingOutcome>,
    pub debits: Vec<PostingOutcome>,
    pub warnings: Vec<Diagnostic>,
}

impl ItemOutcome {
    fn new(recipe_id: Uuid) -> Self {
        Self {
            recipe_id,
            ok: true,
            credit: None,
            debits: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn failed_postings(&self) -> usize {
        self.credit.iter().chain(&self.debits).filter(|p| !p.is_ok()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionOutcome {
    pub order_id: Uuid,
    /// True whenever the run reached the end, independent of rejected rows
    pub success: bool,
    pub status: OrderAdjustmentStatus,
    pub items: Vec<ItemOutcome>,
    pub warnings: Vec<Diagnostic>,
}

impl ProductionOutcome {
    pub fn summary(&self) -> String {
        format!("processed with {} warnings", self.warnings.len())
    }

    pub fn failed_postings(&self) -> usize {
        self.items.iter().map(ItemOutcome::failed_postings).sum()
    }
}

/// Write path: credits finished goods and debits consumed materials for a
/// confirmed production order.
///
/// Postings go out one at a time, in item order. A rejected row is recorded and
/// the run continues; nothing already posted is ever compensated.
#[derive(Clone)]
pub struct StockAdjustmentService {
    recipes: Arc<dyn RecipeRepository>,
    sink: Arc<dyn InventorySink>,
    max_depth: usize,
    event_sender: Option<EventSender>,
}

impl StockAdjustmentService {
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        sink: Arc<dyn InventorySink>,
        max_depth: usize,
    ) -> Self {
        Self {
            recipes,
            sink,
            max_depth,
            event_sender: None,
        }
    }

    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Applies a production outcome to stock.
    ///
    /// Only connectivity-level failures of the repository or sink abort the run.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn apply_production_outcome(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        items: &[ProductionOrderItem],
        adjust_materials: bool,
    ) -> Result<ProductionOutcome, ServiceError> {
        let today = Utc::now().date_naive();

        let catalog = if adjust_materials {
            let roots: Vec<Uuid> = items.iter().map(|item| item.recipe_id).collect();
            Some(
                RecipeCatalog::load(self.recipes.as_ref(), tenant_id, &roots, self.max_depth)
                    .await?,
            )
        } else {
            None
        };

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let produced = item.produced_quantity();
            if produced <= 0.0 {
                info!(recipe_id = %item.recipe_id, "nothing produced; item skipped");
                continue;
            }

            let mut outcome = ItemOutcome::new(item.recipe_id);
            if let Unit::Other(raw) = &item.unit {
                let diagnostic = Diagnostic::UnsupportedUnit {
                    recipe_id: item.recipe_id,
                    unit: raw.clone(),
                };
                warn!("{}", diagnostic);
                outcome.warnings.push(diagnostic);
                outcomes.push(outcome);
                continue;
            }

            let recipe = match &catalog {
                Some(catalog) => catalog
                    .recipe(item.recipe_id)
                    .cloned()
                    .ok_or_else(|| catalog.absence(item.recipe_id)),
                None => self.lookup_recipe(tenant_id, item.recipe_id).await?,
            };

            let recipe = match recipe {
                Ok(recipe) => recipe,
                Err(diagnostic) => {
                    warn!("{}", diagnostic);
                    outcome.warnings.push(diagnostic);
                    outcomes.push(outcome);
                    continue;
                }
            };

            if let Some(product_id) = recipe.product_id {
                let request = self.transaction(
                    tenant_id,
                    order_id,
                    today,
                    product_id,
                    Direction::In,
                    produced,
                    item.unit.clone(),
                    REASON_PRODUCTION,
                );
                outcome.credit = Some(self.post(request, &mut outcome.warnings).await?);
            }

            if let Some(catalog) = &catalog {
                self.debit_materials(
                    catalog,
                    &recipe,
                    item,
                    tenant_id,
                    order_id,
                    today,
                    &mut outcome,
                )
                .await?;
            }

            outcome.ok = outcome.failed_postings() == 0;
            outcomes.push(outcome);
        }

        let warnings: Vec<Diagnostic> = outcomes
            .iter()
            .flat_map(|o| o.warnings.iter().cloned())
            .collect();
        let status = if outcomes.iter().all(|o| o.ok) {
            OrderAdjustmentStatus::Completed
        } else {
            OrderAdjustmentStatus::PartiallyApplied
        };
        let result = ProductionOutcome {
            order_id,
            success: true,
            status,
            items: outcomes,
            warnings,
        };

        let failed_postings = result.failed_postings();
        if failed_postings > 0 {
            warn!(
                %order_id,
                failed_postings,
                "production outcome partially applied; rejected postings need manual correction"
            );
        }
        info!(%order_id, status = %result.status, "{}", result.summary());

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProductionOutcomeApplied {
                    tenant_id,
                    order_id,
                    success: result.success,
                    failed_postings,
                    warnings: result.warnings.len(),
                })
                .await;
        }

        Ok(result)
    }

    /// Single-recipe read for credit-only runs. Only connectivity failures are returned
    /// as errors; anything else becomes the item's diagnostic.
    async fn lookup_recipe(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Result<Recipe, Diagnostic>, ServiceError> {
        match self.recipes.get_recipe(tenant_id, recipe_id).await {
            Ok(Some(recipe)) => Ok(Ok(recipe)),
            Ok(None) => Ok(Err(Diagnostic::RecipeNotFound { recipe_id })),
            Err(e) if e.is_connectivity() => {
                error!(%recipe_id, "recipe store unreachable: {}", e);
                Err(e)
            }
            Err(e) => Ok(Err(Diagnostic::RecipeUnreadable {
                recipe_id,
                reason: e.to_string(),
            })),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn debit_materials(
        &self,
        catalog: &RecipeCatalog,
        recipe: &Recipe,
        item: &ProductionOrderItem,
        tenant_id: Uuid,
        order_id: Uuid,
        date: NaiveDate,
        outcome: &mut ItemOutcome,
    ) -> Result<(), ServiceError> {
        let Some(mass) = produced_mass(item, recipe) else {
            let diagnostic = Diagnostic::MassConversionUnavailable {
                recipe_id: recipe.id,
            };
            warn!("{}", diagnostic);
            outcome.warnings.push(diagnostic);
            return Ok(());
        };

        let expansion = BomExpander::new(catalog, self.max_depth).expand(recipe.id, mass, &Unit::Mass);
        outcome.warnings.extend(expansion.warnings);

        let aggregated = aggregate(expansion.requirements);
        outcome.warnings.extend(aggregated.warnings);

        for requirement in aggregated.totals.into_values() {
            let request = self.transaction(
                tenant_id,
                order_id,
                date,
                requirement.product_id,
                Direction::Out,
                requirement.quantity,
                requirement.unit,
                REASON_PRODUCTION_CONSUMPTION,
            );
            let posted = self.post(request, &mut outcome.warnings).await?;
            outcome.debits.push(posted);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn transaction(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        date: NaiveDate,
        product_id: Uuid,
        direction: Direction,
        quantity: f64,
        unit: Unit,
        reason: &str,
    ) -> NewInventoryTransaction {
        NewInventoryTransaction {
            tenant_id,
            product_id,
            direction,
            quantity,
            unit,
            date,
            reason: reason.to_string(),
            unit_cost: None,
            order_id: Some(order_id),
        }
    }

    async fn post(
        &self,
        request: NewInventoryTransaction,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<PostingOutcome, ServiceError> {
        let mut outcome = PostingOutcome {
            product_id: request.product_id,
            direction: request.direction,
            quantity: request.quantity,
            unit: request.unit.clone(),
            new_stock: None,
            error: None,
        };
        let tenant_id = request.tenant_id;
        let order_id = request.order_id;

        match self.sink.post_transaction(request).await {
            Ok(level) => {
                counter!("bakery.stock.postings", 1);
                outcome.new_stock = Some(level.current);

                if let Some(sender) = &self.event_sender {
                    sender
                        .send_or_log(Event::InventoryPosted {
                            tenant_id,
                            product_id: outcome.product_id,
                            direction: outcome.direction,
                            quantity: outcome.quantity,
                            new_stock: level.current,
                            order_id,
                        })
                        .await;
                }
            }
            Err(SinkError::Rejected(reason)) => {
                counter!("bakery.stock.postings.failed", 1);
                error!(
                    product_id = %outcome.product_id,
                    direction = %outcome.direction,
                    "posting rejected: {}",
                    reason
                );
                warnings.push(Diagnostic::PostingFailed {
                    product_id: outcome.product_id,
                    reason: reason.clone(),
                });
                outcome.error = Some(reason);
            }
            Err(SinkError::Unavailable(reason)) => {
                counter!("bakery.stock.postings.failed", 1);
                error!("inventory store unreachable: {}", reason);
                return Err(ServiceError::ServiceUnavailable(reason));
            }
        }
        Ok(outcome)
    }
}

/// Produced mass, converting discrete units through the recipe's yield ratio when
/// no mass was recorded.
fn produced_mass(item: &ProductionOrderItem, recipe: &Recipe) -> Option<f64> {
    item.positive_mass()
        .or_else(|| Some(item.positive_units()? * recipe.mass_per_unit()?))
}
