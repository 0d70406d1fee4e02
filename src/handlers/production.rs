use super::common::{map_service_error, success_response, validate_input, TenantId};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::{OrderLine, ProductionOrderItem, Unit},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for production planning and stock adjustment endpoints
pub fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/materials-list", post(materials_list))
        .route("/pre-weighing-list", post(pre_weighing_list))
        .route("/orders/:order_id/outcome", post(apply_outcome))
        .route("/health", get(health))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct OrderLinesRequest {
    #[validate(length(min = 1))]
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub recipe_id: Uuid,
    pub quantity: f64,
    pub unit: String,
}

impl OrderLinesRequest {
    fn into_lines(self) -> Vec<OrderLine> {
        self.lines
            .into_iter()
            .map(|line| OrderLine::new(line.recipe_id, line.quantity, Unit::parse(&line.unit)))
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductionOutcomeRequest {
    #[serde(default)]
    pub adjust_materials: bool,
    #[validate(length(min = 1))]
    pub items: Vec<ProductionOrderItem>,
}

// Handler functions

/// Flattened base materials for an order
async fn materials_list(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<OrderLinesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let list = state
        .services
        .planning
        .materials_list(tenant_id, &payload.into_lines())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(list))
}

/// Sub-recipe batch counts plus base materials for an order
async fn pre_weighing_list(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<OrderLinesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let list = state
        .services
        .planning
        .pre_weighing_list(tenant_id, &payload.into_lines())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(list))
}

/// Posts finished-good credits and, optionally, material debits for a confirmed order
async fn apply_outcome(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ProductionOutcomeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .stock_adjustment
        .apply_production_outcome(
            tenant_id,
            order_id,
            &payload.items,
            payload.adjust_materials,
        )
        .await
        .map_err(map_service_error)?;

    info!("Production outcome for order {}: {}", order_id, outcome.summary());

    Ok(success_response(outcome))
}

async fn health() -> impl IntoResponse {
    success_response(json!({ "status": "ok" }))
}
