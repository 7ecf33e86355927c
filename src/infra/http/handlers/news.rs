use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::HttpState;
use crate::infra::http::error::{ApiError, news_to_api};
use crate::infra::http::payload::WritePayload;

use super::parse_id;

pub async fn list_news(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.news.list().await.map_err(news_to_api)?;
    Ok(Json(posts))
}

pub async fn get_news(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let post = state.news.get(id).await.map_err(news_to_api)?;
    Ok(Json(post))
}

pub async fn create_news(
    State(state): State<HttpState>,
    payload: WritePayload,
) -> Result<impl IntoResponse, ApiError> {
    let command = payload.into_news_command()?;
    let post = state.news.create(command).await.map_err(news_to_api)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_news(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
    payload: WritePayload,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let command = payload.into_news_command()?;
    state.news.update(id, command).await.map_err(news_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_news(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    state.news.delete(id).await.map_err(news_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
