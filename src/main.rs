use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use catalog_mirror::config;
use catalog_mirror::db;
use catalog_mirror::scheduler::{spawn_scheduler, SyncRunner};
use catalog_mirror::server::{self, ServerState};
use catalog_mirror::upstream::CatalogClient;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Optional YAML config file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve the mirrored data without running the periodic sync
    #[arg(long)]
    no_sync: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    catalog_mirror::init_tracing();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;

    let pool = db::init_pool(&cfg.app.database_url).await?;
    db::run_migrations(&pool).await?;

    let client = CatalogClient::from_config(&cfg)?;
    info!(upstream = %client.base_url(), "using upstream catalog");
    let runner = Arc::new(SyncRunner::new(
        pool,
        Arc::new(client),
        cfg.app.sync_concurrency,
    ));

    let scheduler = if args.no_sync {
        warn!("periodic sync disabled");
        None
    } else {
        Some(spawn_scheduler(runner.clone(), cfg.sync_interval()))
    };

    let state = ServerState::new(runner, &cfg);
    server::run_server(&cfg.listen_addr(), state, shutdown_signal()).await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
