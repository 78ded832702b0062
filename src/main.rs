use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use eventdesk::auth::StoredAdminAuth;
use eventdesk::config;
use eventdesk::db;
use eventdesk::gateway::RazorpayClient;
use eventdesk::server::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    eventdesk::init_tracing();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let state = AppState {
        gateway: Arc::new(RazorpayClient::from_config(&cfg)?),
        auth: Arc::new(StoredAdminAuth::new(
            pool.clone(),
            cfg.admin.token_ttl_minutes,
        )),
        currency: cfg.gateway.currency.clone(),
        pool,
    };

    let listener = tokio::net::TcpListener::bind(&cfg.app.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.app.bind_addr))?;
    info!(addr = %cfg.app.bind_addr, "starting eventdesk API");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
