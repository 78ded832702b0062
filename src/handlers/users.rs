use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::handlers::present;
use crate::model::User;
use crate::server::AppState;
use crate::util::{extract_last10_digits, extract_referral_code};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLookupQuery {
    pub mobile_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLookupResponse {
    pub is_ok: bool,
    pub user: UserView,
}

/// `GET /api/users/lookup?mobileNumber=...`
#[instrument(skip_all)]
pub async fn lookup_user(
    State(state): State<AppState>,
    query: Result<Query<UserLookupQuery>, QueryRejection>,
) -> ApiResult<Json<UserLookupResponse>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let raw = present(query.mobile_number.as_deref())
        .ok_or_else(|| ApiError::validation("mobileNumber is required"))?;
    let mobile = extract_last10_digits(raw);
    if mobile.is_empty() {
        return Err(ApiError::validation("mobileNumber must contain digits"));
    }

    let user = db::find_user_by_mobile(&state.pool, &mobile)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let referral_code = user.referred_by.as_deref().map(extract_referral_code);
    Ok(Json(UserLookupResponse {
        is_ok: true,
        user: UserView {
            user,
            referral_code,
        },
    }))
}
