use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use eventdesk::config;
use eventdesk::db;
use eventdesk::export::{self, ExportTable};
use eventdesk::shortener::{TinyUrlClient, UrlShortener};

#[derive(Debug, Parser)]
#[command(about = "Export users, events or invoices to a CSV file")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Table to export
    #[arg(long, value_enum)]
    table: ExportTable,

    /// Output CSV path
    #[arg(long)]
    out: PathBuf,

    /// Shorten event registration links (events table only)
    #[arg(long)]
    shorten: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    eventdesk::init_tracing();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let table = match args.table {
        ExportTable::Users => export::users_table(&pool).await?,
        ExportTable::Invoices => export::invoices_table(&pool).await?,
        ExportTable::Events => {
            let shortener = if args.shorten {
                Some(TinyUrlClient::new()?)
            } else {
                None
            };
            export::events_table(
                &pool,
                &cfg.app.public_base_url,
                shortener.as_ref().map(|s| s as &dyn UrlShortener),
            )
            .await?
        }
    };

    table.write_file(&args.out)?;
    info!(rows = table.rows.len(), out = %args.out.display(), "export written");
    println!("Wrote {} rows to {}", table.rows.len(), args.out.display());
    Ok(())
}
