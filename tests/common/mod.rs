#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use bakery_production::{
    config::AppConfig,
    handlers::{common::TENANT_HEADER, AppServices},
    models::{Ingredient, Recipe, Unit},
    repositories::{InMemoryInventorySink, InMemoryRecipeRepository},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// The reference bakery: "Pão Francês" (10 kg / 100 un) uses 6 kg of Farinha and
/// 4 kg of the "Massa Base" sub-recipe (2 kg yield, 0.1 kg of Fermento).
pub struct Bakery {
    pub tenant: Uuid,
    pub pao: Recipe,
    pub massa: Recipe,
    pub pao_product: Uuid,
    pub farinha: Uuid,
    pub fermento: Uuid,
}

impl Bakery {
    pub fn new() -> Self {
        let tenant = Uuid::new_v4();
        let pao_product = Uuid::new_v4();
        Self {
            tenant,
            pao: Recipe {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: "Pão Francês".into(),
                yield_mass: Some(10.0),
                yield_units: Some(100.0),
                product_id: Some(pao_product),
            },
            massa: Recipe {
                id: Uuid::new_v4(),
                tenant_id: tenant,
                name: "Massa Base".into(),
                yield_mass: Some(2.0),
                yield_units: None,
                product_id: None,
            },
            pao_product,
            farinha: Uuid::new_v4(),
            fermento: Uuid::new_v4(),
        }
    }

    pub fn pao_ingredients(&self) -> Vec<Ingredient> {
        vec![
            Ingredient::base(self.pao.id, self.farinha, 6.0, Unit::Mass),
            Ingredient::sub_recipe(self.pao.id, self.massa.id, 4.0, Unit::Mass),
        ]
    }

    pub fn massa_ingredients(&self) -> Vec<Ingredient> {
        vec![Ingredient::base(self.massa.id, self.fermento, 0.1, Unit::Mass)]
    }

    pub fn repository(&self) -> InMemoryRecipeRepository {
        InMemoryRecipeRepository::new()
            .with_recipe(self.pao.clone(), self.pao_ingredients())
            .with_recipe(self.massa.clone(), self.massa_ingredients())
            .with_product(self.tenant, self.farinha, "Farinha")
            .with_product(self.tenant, self.fermento, "Fermento")
            .with_product(self.tenant, self.pao_product, "Pão Francês")
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Router over in-memory collaborators, driven with `oneshot` requests.
pub struct TestApp {
    router: Router,
    pub sink: Arc<InMemoryInventorySink>,
}

impl TestApp {
    pub fn new(repo: InMemoryRecipeRepository, sink: InMemoryInventorySink) -> Self {
        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            0,
            "test".into(),
        );
        let sink = Arc::new(sink);
        let services = AppServices::new(
            Arc::new(repo),
            sink.clone(),
            config.max_expansion_depth,
            None,
        );
        let router = bakery_production::api_router(AppState { config, services });
        Self { router, sink }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        tenant: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tenant) = tenant {
            builder = builder.header(TENANT_HEADER, tenant.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
