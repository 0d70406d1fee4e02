use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{InventorySink, RecipeRepository, SinkError};
use crate::errors::ServiceError;
use crate::models::{Ingredient, NewInventoryTransaction, Recipe, StockLevel};

/// Recipe source over owned maps, for embedding callers and tests.
#[derive(Debug, Default)]
pub struct InMemoryRecipeRepository {
    recipes: HashMap<Uuid, Recipe>,
    ingredients: HashMap<Uuid, Vec<Ingredient>>,
    products: HashMap<Uuid, (Uuid, String)>,
    unreadable: HashMap<Uuid, String>,
    unavailable: AtomicBool,
    recipe_reads: AtomicUsize,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipe(mut self, recipe: Recipe, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients.insert(recipe.id, ingredients);
        self.recipes.insert(recipe.id, recipe);
        self
    }

    pub fn with_product(mut self, tenant_id: Uuid, product_id: Uuid, name: &str) -> Self {
        self.products
            .insert(product_id, (tenant_id, name.to_string()));
        self
    }

    /// Reads of `recipe_id` fail with a row-level database error
    pub fn with_unreadable(mut self, recipe_id: Uuid, reason: &str) -> Self {
        self.unreadable.insert(recipe_id, reason.to_string());
        self
    }

    /// Simulates the recipe store becoming unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check_reachable(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ServiceError::ServiceUnavailable(
                "in-memory recipe store offline".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of `get_recipe` calls served so far
    pub fn recipe_reads(&self) -> usize {
        self.recipe_reads.load(Ordering::Relaxed)
    }

    fn owned_by(&self, tenant_id: Uuid, recipe_id: Uuid) -> Option<&Recipe> {
        self.recipes
            .get(&recipe_id)
            .filter(|recipe| recipe.tenant_id == tenant_id)
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn get_recipe(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Recipe>, ServiceError> {
        self.recipe_reads.fetch_add(1, Ordering::Relaxed);
        self.check_reachable()?;
        if let Some(reason) = self.unreadable.get(&recipe_id) {
            return Err(ServiceError::db_error(DbErr::Custom(reason.clone())));
        }
        Ok(self.owned_by(tenant_id, recipe_id).cloned())
    }

    async fn get_ingredients(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Vec<Ingredient>, ServiceError> {
        self.check_reachable()?;
        if self.owned_by(tenant_id, recipe_id).is_none() {
            return Ok(Vec::new());
        }
        Ok(self.ingredients.get(&recipe_id).cloned().unwrap_or_default())
    }

    async fn get_product_names(
        &self,
        tenant_id: Uuid,
        product_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, String>, ServiceError> {
        self.check_reachable()?;
        Ok(product_ids
            .into_iter()
            .filter_map(|id| {
                self.products
                    .get(&id)
                    .filter(|(owner, _)| *owner == tenant_id)
                    .map(|(_, name)| (id, name.clone()))
            })
            .collect())
    }
}

#[derive(Debug, Default)]
struct SinkState {
    stock: HashMap<Uuid, f64>,
    posted: Vec<NewInventoryTransaction>,
}

/// Stock sink over an in-process map. Unknown products start at zero stock.
#[derive(Debug, Default)]
pub struct InMemoryInventorySink {
    state: Mutex<SinkState>,
    rejected: HashSet<Uuid>,
    unavailable: AtomicBool,
}

impl InMemoryInventorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(mut self, product_id: Uuid, quantity: f64) -> Self {
        self.state.get_mut().stock.insert(product_id, quantity);
        self
    }

    /// Every posting for `product_id` will be rejected
    pub fn rejecting(mut self, product_id: Uuid) -> Self {
        self.rejected.insert(product_id);
        self
    }

    /// Simulates the store becoming unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub async fn stock_of(&self, product_id: Uuid) -> f64 {
        self.state
            .lock()
            .await
            .stock
            .get(&product_id)
            .copied()
            .unwrap_or(0.0)
    }

    /// Transactions accepted so far, in posting order
    pub async fn posted(&self) -> Vec<NewInventoryTransaction> {
        self.state.lock().await.posted.clone()
    }
}

#[async_trait]
impl InventorySink for InMemoryInventorySink {
    async fn post_transaction(
        &self,
        transaction: NewInventoryTransaction,
    ) -> Result<StockLevel, SinkError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(SinkError::Unavailable("in-memory sink offline".to_string()));
        }
        if self.rejected.contains(&transaction.product_id) {
            return Err(SinkError::Rejected(format!(
                "product {} refuses postings",
                transaction.product_id
            )));
        }

        let mut state = self.state.lock().await;
        let previous = state
            .stock
            .get(&transaction.product_id)
            .copied()
            .unwrap_or(0.0);
        let current = previous + transaction.signed_quantity();
        state.stock.insert(transaction.product_id, current);
        let product_id = transaction.product_id;
        state.posted.push(transaction);

        Ok(StockLevel {
            product_id,
            previous,
            current,
        })
    }
}
