//! One-shot ingestion run: fetch all configured feeds, commit leads, print the report.
//!
//! cargo run --bin lead-radar-scan

use anyhow::Context;
use chrono::Utc;

use lead_radar::classifier::Classifier;
use lead_radar::config::RadarConfig;
use lead_radar::ingest::{self, providers::rss::sources_from_config};
use lead_radar::normalize::local_offset;
use lead_radar::store::LeadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    lead_radar::init_tracing();

    let config = RadarConfig::load_default()?;
    let sources = sources_from_config(&config.ingest)?;
    let classifier = Classifier::from_config(&config.classifier);
    let store = LeadStore::from_config(&config.store);

    let report = ingest::run_once(
        &sources,
        &classifier,
        &store,
        local_offset(config.ingest.utc_offset_hours),
        Utc::now(),
    )
    .await
    .with_context(|| format!("writing lead store {}", store.path().display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
