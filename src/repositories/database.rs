use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use super::{InventorySink, RecipeRepository, SinkError};
use crate::{
    entities::{
        inventory_transaction,
        product::{self, Entity as ProductEntity},
        recipe::{self, Entity as RecipeEntity},
        recipe_ingredient::{self, Entity as RecipeIngredientEntity},
    },
    errors::{is_connection_error, ServiceError},
    models::{Ingredient, NewInventoryTransaction, Recipe, StockLevel},
};

/// Recipe source backed by the `recipes`, `recipe_ingredients` and `products` tables
#[derive(Clone)]
pub struct SeaOrmRecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRecipeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeRepository for SeaOrmRecipeRepository {
    #[instrument(skip(self))]
    async fn get_recipe(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Recipe>, ServiceError> {
        let db = &*self.db;

        let recipe = RecipeEntity::find_by_id(recipe_id)
            .filter(recipe::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(|e| {
                error!("Failed to fetch recipe {}: {}", recipe_id, e);
                ServiceError::db_error(e)
            })?;

        Ok(recipe.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn get_ingredients(
        &self,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Vec<Ingredient>, ServiceError> {
        let db = &*self.db;

        let rows = RecipeIngredientEntity::find()
            .filter(recipe_ingredient::Column::TenantId.eq(tenant_id))
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .order_by_asc(recipe_ingredient::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!("Failed to fetch ingredients of recipe {}: {}", recipe_id, e);
                ServiceError::db_error(e)
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    async fn get_product_names(
        &self,
        tenant_id: Uuid,
        product_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, String>, ServiceError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let db = &*self.db;

        let products = ProductEntity::find()
            .filter(product::Column::TenantId.eq(tenant_id))
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!("Failed to fetch product names: {}", e);
                ServiceError::db_error(e)
            })?;

        Ok(products.into_iter().map(|p| (p.id, p.name)).collect())
    }
}

/// Stock sink writing `inventory_transactions` and `products.current_stock`
/// inside one database transaction per posting
#[derive(Clone)]
pub struct SeaOrmInventorySink {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmInventorySink {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn classify(err: DbErr) -> SinkError {
    if is_connection_error(&err) {
        SinkError::Unavailable(err.to_string())
    } else {
        SinkError::Rejected(err.to_string())
    }
}

#[async_trait]
impl InventorySink for SeaOrmInventorySink {
    #[instrument(skip(self, request), fields(product_id = %request.product_id, direction = %request.direction))]
    async fn post_transaction(
        &self,
        request: NewInventoryTransaction,
    ) -> Result<StockLevel, SinkError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            classify(e)
        })?;

        let product = ProductEntity::find_by_id(request.product_id)
            .filter(product::Column::TenantId.eq(request.tenant_id))
            .one(&txn)
            .await
            .map_err(classify)?
            .ok_or_else(|| {
                SinkError::Rejected(format!("product {} not found", request.product_id))
            })?;

        let previous = product.current_stock;
        let current = previous + request.signed_quantity();

        let mut active: product::ActiveModel = product.into();
        active.current_stock = Set(current);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(|e| {
            error!("Failed to update stock of {}: {}", request.product_id, e);
            classify(e)
        })?;

        let entry = inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(request.tenant_id),
            product_id: Set(request.product_id),
            direction: Set(request.direction.to_string()),
            quantity: Set(request.signed_quantity()),
            unit: Set(request.unit.to_string()),
            transaction_date: Set(request.date),
            unit_cost: Set(request.unit_cost),
            production_order_id: Set(request.order_id),
            reason: Set(request.reason.clone()),
            previous_stock: Set(previous),
            new_stock: Set(current),
            created_at: Set(Utc::now()),
        };
        entry.insert(&txn).await.map_err(|e| {
            error!("Failed to record inventory transaction: {}", e);
            classify(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            classify(e)
        })?;

        Ok(StockLevel {
            product_id: request.product_id,
            previous,
            current,
        })
    }
}
