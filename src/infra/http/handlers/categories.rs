use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::infra::http::HttpState;
use crate::infra::http::error::{ApiError, category_to_api};

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct SortOrderRequest {
    pub sort_order: i32,
}

pub async fn list_categories(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .categories
        .list_categories()
        .await
        .map_err(category_to_api)?;
    Ok(Json(categories))
}

pub async fn update_sort_order(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<SortOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(body) = payload
        .map_err(|rej| ApiError::bad_request("Invalid sort order payload", Some(rej.body_text())))?;
    state
        .categories
        .update_sort_order(id, body.sort_order)
        .await
        .map_err(category_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_category(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    state
        .categories
        .delete_category(id)
        .await
        .map_err(category_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
