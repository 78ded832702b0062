pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod gateway;
pub mod handlers;
pub mod model;
pub mod oauth;
pub mod server;
pub mod shortener;
pub mod util;

#[cfg(test)]
mod test_support;

/// Compact `tracing` output filtered by `RUST_LOG`, shared by the server and scripts.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
