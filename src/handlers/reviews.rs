use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::db::{self, ReviewWithSummary};
use crate::error::{ApiError, ApiResult};
use crate::handlers::bearer_token;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReviewsResponse {
    pub is_ok: bool,
    pub reviews: Vec<ReviewWithSummary>,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllReviewsResponse {
    pub is_ok: bool,
    pub reviews: Vec<ReviewWithSummary>,
}

/// Mean of the positive ratings; absent and non-positive ratings are ignored
/// entirely. Returns 0 when nothing qualifies.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = ratings
        .into_iter()
        .flatten()
        .filter(|r| *r > 0.0)
        .fold((0.0_f64, 0_u32), |(sum, count), r| (sum + r, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / f64::from(count)
}

/// `GET /api/events/:event_id/reviews`: completed reviews of one event.
#[instrument(skip_all)]
pub async fn event_reviews(
    State(state): State<AppState>,
    event_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<EventReviewsResponse>> {
    let Path(event_id) =
        event_id.map_err(|_| ApiError::validation("eventId must be a numeric id"))?;

    let reviews = db::completed_reviews_for_event(&state.pool, event_id).await?;
    let average = average_rating(reviews.iter().map(|r| r.review.rating));

    Ok(Json(EventReviewsResponse {
        is_ok: true,
        total_reviews: reviews.len(),
        average_rating: average,
        reviews,
    }))
}

/// `GET /api/admin/reviews`: every review, newest first. Admin token required.
#[instrument(skip_all)]
pub async fn all_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AllReviewsResponse>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Admin token required"))?;
    if !state.auth.verify(token).await? {
        return Err(ApiError::unauthorized("Invalid or expired admin token"));
    }

    let reviews = db::list_all_reviews(&state.pool).await?;
    Ok(Json(AllReviewsResponse {
        is_ok: true,
        reviews,
    }))
}
