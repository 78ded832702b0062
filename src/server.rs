//! Router assembly and the state shared by every handler.

use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AdminAuthenticator;
use crate::db::Pool;
use crate::error::ApiError;
use crate::gateway::PaymentGateway;
use crate::handlers::{admin, events, health, invoices, reviews, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub auth: Arc<dyn AdminAuthenticator>,
    /// ISO currency code invoices are issued in.
    pub currency: String,
}

/// # Routes
///
/// - `GET  /healthz`
/// - `GET  /api/users/lookup?mobileNumber=`
/// - `GET  /api/events?category=`
/// - `GET  /api/events/:event_id/reviews`
/// - `POST /api/admin/login`
/// - `GET  /api/admin/reviews`
/// - `POST /api/invoices`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health))
        .route("/api/users/lookup", get(users::lookup_user))
        .route("/api/events", get(events::list_by_category))
        .route("/api/events/:event_id/reviews", get(reviews::event_reviews))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/reviews", get(reviews::all_reviews))
        .route("/api/invoices", post(invoices::create_invoice))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal(anyhow!("request handler panicked")).into_response()
}
