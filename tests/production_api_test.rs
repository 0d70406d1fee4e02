mod common;

use axum::http::{Method, StatusCode};
use bakery_production::repositories::InMemoryInventorySink;
use common::{approx, Bakery, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_ok() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());

    let (status, body) = app
        .request(Method::GET, "/api/v1/production/health", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn materials_list_requires_tenant_header() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/production/materials-list",
            None,
            Some(json!({ "lines": [{ "recipe_id": bakery.pao.id, "quantity": 20.0, "unit": "kg" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("x-tenant-id"));
}

#[tokio::test]
async fn materials_list_returns_named_materials() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/production/materials-list",
            Some(bakery.tenant),
            Some(json!({ "lines": [{ "recipe_id": bakery.pao.id, "quantity": 20.0, "unit": "kg" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let materials = body["materials"].as_array().unwrap();
    assert_eq!(materials.len(), 2);
    let farinha = materials
        .iter()
        .find(|m| m["product_name"] == "Farinha")
        .unwrap();
    assert!(approx(farinha["quantity"].as_f64().unwrap(), 12.0));
    assert_eq!(farinha["unit"], "kg");
}

#[tokio::test]
async fn empty_order_is_a_validation_error() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/production/pre-weighing-list",
            Some(bakery.tenant),
            Some(json!({ "lines": [] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_quantity_is_rejected() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/production/materials-list",
            Some(bakery.tenant),
            Some(json!({ "lines": [{ "recipe_id": bakery.pao.id, "quantity": -1.0, "unit": "kg" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("positive"));
}

#[tokio::test]
async fn outcome_endpoint_posts_stock() {
    let bakery = Bakery::new();
    let app = TestApp::new(bakery.repository(), InMemoryInventorySink::new());
    let order_id = Uuid::new_v4();

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/production/orders/{}/outcome", order_id),
            Some(bakery.tenant),
            Some(json!({
                "adjust_materials": true,
                "items": [{ "recipe_id": bakery.pao.id, "produced_mass": 20.0, "unit": "kg" }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_id"], order_id.to_string());
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["items"][0]["debits"].as_array().unwrap().len(), 2);
    assert!(approx(app.sink.stock_of(bakery.pao_product).await, 20.0));
}
