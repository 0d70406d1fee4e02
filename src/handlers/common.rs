use crate::errors::{ApiError, ServiceError};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// Header carrying the owning company of every request
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Tenant scope taken from the `x-tenant-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", TENANT_HEADER)))?;

        let value = raw
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} header is not valid text", TENANT_HEADER)))?;

        Uuid::parse_str(value.trim())
            .map(TenantId)
            .map_err(|_| ApiError::BadRequest(format!("{} header must be a UUID", TENANT_HEADER)))
    }
}
