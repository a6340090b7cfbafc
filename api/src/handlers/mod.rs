pub mod categories;
pub mod health;
pub mod metrics;
pub mod resources;

// Common response types
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use common::errors::{ApiError, CatalogError};

/// Error body returned by every catalog endpoint
#[derive(Debug)]
pub struct ErrorResponse(pub ApiError);

impl ErrorResponse {
    pub fn status(&self) -> StatusCode {
        match self.0.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "PERSISTENCE_UNAVAILABLE" | "CONNECTION_ERROR" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for ErrorResponse {
    fn from(err: CatalogError) -> Self {
        if matches!(err, CatalogError::Database(_)) {
            tracing::error!(error = %err, "Catalog request failed");
        }
        Self(err.into())
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self(ApiError::new("VALIDATION_ERROR", rejection.body_text()))
    }
}

impl From<PathRejection> for ErrorResponse {
    fn from(rejection: PathRejection) -> Self {
        Self(ApiError::new("VALIDATION_ERROR", rejection.body_text()))
    }
}

impl From<QueryRejection> for ErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self(ApiError::new("VALIDATION_ERROR", rejection.body_text()))
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0)).into_response()
    }
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
