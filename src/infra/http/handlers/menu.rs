use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::HttpState;
use crate::infra::http::error::{ApiError, menu_to_api};
use crate::infra::http::payload::WritePayload;

use super::parse_id;

pub async fn list_menu(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let items = state.menu.list().await.map_err(menu_to_api)?;
    Ok(Json(items))
}

pub async fn get_menu_item(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let item = state.menu.get(id).await.map_err(menu_to_api)?;
    Ok(Json(item))
}

pub async fn create_menu_item(
    State(state): State<HttpState>,
    payload: WritePayload,
) -> Result<impl IntoResponse, ApiError> {
    let command = payload.into_menu_command()?;
    let item = state.menu.create(command).await.map_err(menu_to_api)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
    payload: WritePayload,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let command = payload.into_menu_command()?;
    state.menu.update(id, command).await.map_err(menu_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_menu_item(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    state.menu.delete(id).await.map_err(menu_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
