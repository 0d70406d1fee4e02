// Domain models shared by the services, repositories and handlers
pub mod diagnostic;
pub mod inventory;
pub mod production;
pub mod recipe;
pub mod requirement;
pub mod unit;

pub use diagnostic::Diagnostic;
pub use inventory::{
    Direction, NewInventoryTransaction, StockLevel, REASON_PRODUCTION,
    REASON_PRODUCTION_CONSUMPTION,
};
pub use production::ProductionOrderItem;
pub use recipe::{Ingredient, IngredientTarget, Recipe};
pub use requirement::{round_batches, BaseRequirement, OrderLine, SubRecipeSubtotal};
pub use unit::Unit;
