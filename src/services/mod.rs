// Recipe graph loading and BOM expansion
pub mod aggregation;
pub mod bom;
pub mod catalog;

// Read and write paths exposed to handlers
pub mod planning;
pub mod stock_adjustment;

pub use aggregation::{aggregate, AggregatedRequirements, RequirementAggregator};
pub use bom::{BomExpander, BomReport, Expansion, ExpansionMode};
pub use catalog::RecipeCatalog;
pub use planning::{MaterialLine, MaterialsList, PreWeighingList, ProductionPlanningService};
pub use stock_adjustment::{
    ItemOutcome, OrderAdjustmentStatus, PostingOutcome, ProductionOutcome,
    StockAdjustmentService,
};
