use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A condition recovered locally during expansion or stock adjustment.
///
/// Each one is logged where it is raised and handed back to the caller so the
/// confirming UI can report "processed with N warnings".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("recipe {recipe_id} not found for tenant")]
    RecipeNotFound { recipe_id: Uuid },

    #[error("recipe {recipe_id} could not be read and was skipped: {reason}")]
    RecipeUnreadable { recipe_id: Uuid, reason: String },

    #[error("recipe {recipe_id} has no usable yield for unit '{unit}'")]
    InvalidYield { recipe_id: Uuid, unit: String },

    #[error("recipe {recipe_id} requested in unsupported unit '{unit}'")]
    UnsupportedUnit { recipe_id: Uuid, unit: String },

    #[error("ingredient {ingredient_id} of recipe {recipe_id} is malformed and was skipped")]
    MalformedIngredient { recipe_id: Uuid, ingredient_id: Uuid },

    #[error("recipe {recipe_id} not expanded: nesting depth {depth} exceeds limit {max_depth}")]
    DepthLimitReached {
        recipe_id: Uuid,
        depth: usize,
        max_depth: usize,
    },

    #[error("product {product_id} required in '{found}' and '{kept}'; summed without conversion as '{kept}'")]
    UnitMismatch {
        product_id: Uuid,
        kept: String,
        found: String,
    },

    #[error("sub-recipe {recipe_id} required in '{found}' and '{kept}'; summed without conversion as '{kept}'")]
    SubRecipeUnitMismatch {
        recipe_id: Uuid,
        kept: String,
        found: String,
    },

    #[error("recipe {recipe_id}: produced units cannot be converted to mass; materials not debited")]
    MassConversionUnavailable { recipe_id: Uuid },

    #[error("posting for product {product_id} failed: {reason}")]
    PostingFailed { product_id: Uuid, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let recipe_id = Uuid::nil();
        let value = serde_json::to_value(Diagnostic::RecipeNotFound { recipe_id }).unwrap();
        assert_eq!(value["kind"], "recipe_not_found");
        assert_eq!(value["recipe_id"], recipe_id.to_string());
    }

    #[test]
    fn display_names_the_subject() {
        let product_id = Uuid::new_v4();
        let text = Diagnostic::UnitMismatch {
            product_id,
            kept: "kg".into(),
            found: "un".into(),
        }
        .to_string();
        assert!(text.contains(&product_id.to_string()));
        assert!(text.contains("without conversion"));
    }
}
