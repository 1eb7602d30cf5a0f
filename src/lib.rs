//! Mirrors a remote batch catalog into SQLite on a timer and serves the
//! mirrored data over HTTP.

pub mod config;
pub mod db;
pub mod model;
pub mod scheduler;
pub mod server;
pub mod sync;
pub mod upstream;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber shared by every binary. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .init();
}
