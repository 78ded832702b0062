//! Row and view models used by repositories.
//!
//! Keep these structs focused on the data returned by queries. Response
//! shaping lives in the handlers.

use crate::model::{Event, EventReview};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the event/trainer join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventTrainerLink {
    pub event_id: i64,
    pub trainer_name: String,
}

/// Event together with the raw join rows naming its trainers.
#[derive(Debug, Clone)]
pub struct EventWithTrainers {
    pub event: Event,
    pub trainer_links: Vec<EventTrainerLink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
}

/// Review with the user and event it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithSummary {
    #[serde(flatten)]
    pub review: EventReview,
    pub user: UserSummary,
    pub event: EventSummary,
}

/// Values written when mirroring a gateway invoice locally.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_id: String,
    pub amount: f64,
    pub user_id: i64,
    pub event_id: i64,
    pub gateway_invoice_id: String,
    pub short_url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
