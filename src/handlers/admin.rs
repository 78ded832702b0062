use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::handlers::present;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub is_ok: bool,
    pub token: String,
}

/// `POST /api/admin/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let (Some(username), Some(password)) = (
        present(req.username.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("username and password are required"));
    };

    match state.auth.login(username, password).await? {
        Some(token) => {
            info!(username, "admin logged in");
            Ok(Json(LoginResponse { is_ok: true, token }))
        }
        None => Err(ApiError::unauthorized("Invalid credentials")),
    }
}
