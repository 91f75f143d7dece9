// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod browse;
pub mod classifier;
pub mod config;
pub mod ingest;
pub mod lead;
pub mod metrics;
pub mod normalize;
pub mod store;

pub use crate::api::router;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG` (default `lead_radar=info,warn`).
/// `RADAR_LOG_JSON=1` switches to JSON lines. A second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lead_radar=info,warn"));

    let json = std::env::var("RADAR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
