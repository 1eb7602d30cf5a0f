use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use catalog_mirror::config;
use catalog_mirror::db;
use catalog_mirror::sync::run_sync;
use catalog_mirror::upstream::CatalogClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run a single catalog sync pass against the configured database and exit"
)]
struct Args {
    /// Optional YAML config file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of batches synced concurrently
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    catalog_mirror::init_tracing();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;

    let pool = db::init_pool(&cfg.app.database_url).await?;
    db::run_migrations(&pool).await?;

    let client = CatalogClient::from_config(&cfg)?;
    let concurrency = args.concurrency.unwrap_or(cfg.app.sync_concurrency).max(1);

    let before = db::count_batches(&pool).await?;
    info!(stored = before, upstream = %client.base_url(), "starting one-shot sync");

    let report = run_sync(&pool, &client, concurrency).await?;

    let after = db::count_batches(&pool).await?;
    info!(
        seen = report.batches_seen,
        written = report.batches_written,
        degraded = report.degraded_fetches,
        new_batches = after - before,
        "one-shot sync finished"
    );
    Ok(())
}
