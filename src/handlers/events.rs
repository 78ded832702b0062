use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::categories;
use crate::db::{self, EventWithTrainers};
use crate::error::{ApiError, ApiResult};
use crate::handlers::present;
use crate::server::AppState;
use crate::util::format_long_date;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// An upcoming event as listed to visitors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    /// Long-form date, e.g. `October 18, 2026`.
    pub event_date: String,
    pub price: f64,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub trainers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_link: Option<&'static str>,
}

impl From<EventWithTrainers> for EventView {
    fn from(row: EventWithTrainers) -> Self {
        let EventWithTrainers {
            event,
            trainer_links,
        } = row;
        Self {
            event_date: format_long_date(&event.event_date),
            media_link: categories::media_link(&event.category),
            trainers: trainer_links.into_iter().map(|l| l.trainer_name).collect(),
            id: event.id,
            title: event.title,
            description: event.description,
            category: event.category,
            price: event.price,
            registration_deadline: event.registration_deadline,
            location: event.location,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub is_ok: bool,
    pub events: Vec<EventView>,
}

/// `GET /api/events?category=...`
#[instrument(skip_all)]
pub async fn list_by_category(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> ApiResult<Json<EventListResponse>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let category = present(query.category.as_deref())
        .ok_or_else(|| ApiError::validation("category is required"))?;

    let rows = db::upcoming_events_by_category(&state.pool, category, Utc::now()).await?;
    debug!(category, count = rows.len(), "listed upcoming events");

    Ok(Json(EventListResponse {
        is_ok: true,
        events: rows.into_iter().map(EventView::from).collect(),
    }))
}
