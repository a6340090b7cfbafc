use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{NewResource, Resource, ResourceFilter};

/// Query parameters for free-text search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Request to toggle the featured flag
#[derive(Debug, Deserialize)]
pub struct FeaturedRequest {
    pub featured: bool,
}

/// List resources newest first, optionally by category and featured flag
#[tracing::instrument(skip(state))]
pub async fn list_resources(
    State(state): State<AppState>,
    filter: Result<Query<ResourceFilter>, QueryRejection>,
) -> Result<SuccessResponse<Vec<Resource>>, ErrorResponse> {
    let Query(filter) = filter?;
    let resources = state.catalog.list_resources(filter).await?;
    Ok(SuccessResponse::new(resources))
}

#[tracing::instrument(skip(state))]
pub async fn search_resources(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<SuccessResponse<Vec<Resource>>, ErrorResponse> {
    let Query(params) = params?;
    let resources = state.search.search(&params.q).await?;
    Ok(SuccessResponse::new(resources))
}

#[tracing::instrument(skip(state))]
pub async fn get_resource(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<SuccessResponse<Resource>, ErrorResponse> {
    let Path(id) = id?;
    Ok(SuccessResponse::new(state.catalog.get_resource(id).await?))
}

/// Create a resource under an existing category
#[tracing::instrument(skip(state, payload))]
pub async fn create_resource(
    State(state): State<AppState>,
    payload: Result<Json<NewResource>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let Json(input) = payload?;
    let resource = state.catalog.create_resource(&input).await?;
    Ok((StatusCode::CREATED, SuccessResponse::new(resource)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ErrorResponse> {
    let Path(id) = id?;
    state.catalog.delete_resource(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, payload))]
pub async fn set_featured(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<FeaturedRequest>, JsonRejection>,
) -> Result<SuccessResponse<Resource>, ErrorResponse> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let resource = state.catalog.set_featured(id, req.featured).await?;
    Ok(SuccessResponse::new(resource))
}
