//! Collaborator contracts consumed by the production engine: a read-only recipe
//! source and a stock-mutation sink, plus database-backed and in-memory
//! implementations of both.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Ingredient, NewInventoryTransaction, Recipe, StockLevel};

pub mod database;
pub mod in_memory;

pub use database::{SeaOrmInventorySink, SeaOrmRecipeRepository};
pub use in_memory::{InMemoryInventorySink, InMemoryRecipeRepository};

/// Read access to recipes, their ingredient rows and product names.
///
/// Every read is scoped by `tenant_id`; a record belonging to another tenant is
/// reported exactly like a missing one.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn get_recipe(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Recipe>, ServiceError>;

    async fn get_ingredients(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Vec<Ingredient>, ServiceError>;

    async fn get_product_names(
        &self,
        tenant_id: Uuid,
        product_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, String>, ServiceError>;
}

/// Failure of a single posting
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    /// The store refused this row (unknown product, constraint); other rows may still succeed
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The store could not be reached at all
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Appends an inventory transaction and moves the product's cached stock with it,
/// atomically per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventorySink: Send + Sync {
    async fn post_transaction(
        &self,
        transaction: NewInventoryTransaction,
    ) -> Result<StockLevel, SinkError>;
}
