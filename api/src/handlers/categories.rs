use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::Category;

/// Request to create a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// List all categories
#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<SuccessResponse<Vec<Category>>, ErrorResponse> {
    let categories = state.catalog.list_categories().await?;
    Ok(SuccessResponse::new(categories))
}

#[tracing::instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<SuccessResponse<Category>, ErrorResponse> {
    let Path(id) = id?;
    Ok(SuccessResponse::new(state.catalog.get_category(id).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let Json(req) = payload?;
    let category = state
        .catalog
        .create_category(&req.name, &req.description)
        .await?;
    Ok((StatusCode::CREATED, SuccessResponse::new(category)))
}

/// Delete a category; refused while resources still reference it
#[tracing::instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ErrorResponse> {
    let Path(id) = id?;
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
