//! Route handlers. Each one validates its input, makes one downstream call
//! and shapes the JSON response.

pub mod admin;
pub mod events;
pub mod health;
pub mod invoices;
pub mod reviews;
pub mod users;

use axum::http::{header, HeaderMap};

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Trimmed, non-empty string field.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
