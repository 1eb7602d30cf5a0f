pub mod routes;
pub mod state;

pub use routes::make_app;
pub use state::ServerState;

use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Bind `addr` and serve the API until `shutdown` resolves.
pub async fn run_server<F>(addr: &str, state: ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "http server listening");
    axum::serve(listener, make_app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")?;
    Ok(())
}
