pub mod common;
pub mod production;

use crate::events::EventSender;
use crate::repositories::{InventorySink, RecipeRepository};
use crate::services::{ProductionPlanningService, StockAdjustmentService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub planning: Arc<ProductionPlanningService>,
    pub stock_adjustment: Arc<StockAdjustmentService>,
}

impl AppServices {
    /// Wires both paths over the same collaborators.
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        sink: Arc<dyn InventorySink>,
        max_expansion_depth: usize,
        event_sender: Option<EventSender>,
    ) -> Self {
        let planning = Arc::new(ProductionPlanningService::new(
            recipes.clone(),
            max_expansion_depth,
        ));

        let mut stock_adjustment = StockAdjustmentService::new(recipes, sink, max_expansion_depth);
        if let Some(sender) = event_sender {
            stock_adjustment = stock_adjustment.with_event_sender(sender);
        }

        Self {
            planning,
            stock_adjustment: Arc::new(stock_adjustment),
        }
    }
}
