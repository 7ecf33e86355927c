use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::infra::http::HttpState;
use crate::infra::http::error::{ApiError, auth_to_api};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

pub async fn login(
    State(state): State<HttpState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload
        .map_err(|rej| ApiError::bad_request("Invalid login payload", Some(rej.body_text())))?;
    let token = state.auth.login(&body.password).map_err(auth_to_api)?;
    info!("Administrator logged in");
    Ok(Json(LoginResponse { token }))
}

/// Tokens are stateless, so there is nothing to revoke server-side.
pub async fn logout() -> impl IntoResponse {
    Json(LogoutResponse {
        message: "Logout successful",
    })
}
