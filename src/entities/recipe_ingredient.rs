use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{self, Unit};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub recipe_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub is_sub_recipe: bool,
    pub product_id: Option<Uuid>,
    pub sub_recipe_id: Option<Uuid>,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id"
    )]
    Recipe,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for models::Ingredient {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            recipe_id: model.recipe_id,
            quantity: model.quantity,
            unit: Unit::parse(&model.unit),
            is_sub_recipe: model.is_sub_recipe,
            product_id: model.product_id,
            sub_recipe_id: model.sub_recipe_id,
        }
    }
}
