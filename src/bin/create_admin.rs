use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use eventdesk::auth::{hash_password, PASSWORD_COST};
use eventdesk::config;
use eventdesk::db;

#[derive(Debug, Parser)]
#[command(about = "Create an admin account for the admin API")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    eventdesk::init_tracing();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let username = args.username.trim();
    if username.is_empty() || args.password.is_empty() {
        bail!("username and password must be non-empty");
    }
    if db::find_admin_by_username(&pool, username).await?.is_some() {
        bail!("admin '{username}' already exists");
    }

    let hash = hash_password(&args.password, PASSWORD_COST)?;
    let id = db::insert_admin(&pool, username, &hash).await?;
    info!(id, username, "admin created");
    println!("Created admin '{username}' (id {id})");
    Ok(())
}
