pub mod inventory_transaction;
pub mod product;
pub mod recipe;
pub mod recipe_ingredient;
