//! Lead radar: Shuttle entrypoint
//! Boots the Axum HTTP server: lead browsing, scan trigger, metrics.

use lead_radar::api::{self, AppState};
use lead_radar::config::RadarConfig;
use lead_radar::metrics::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    lead_radar::init_tracing();

    let config = RadarConfig::load_default()?;
    tracing::info!(
        policy = ?config.classifier.policy,
        feeds = config.ingest.feeds.len(),
        store = %config.store.path.display(),
        "config loaded"
    );

    let state = AppState::from_config(config)?;
    let mut router = api::router(state);

    match Metrics::install() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
