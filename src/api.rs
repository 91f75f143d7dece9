// src/api.rs
//! HTTP surface: browse leads by date, trigger a scan.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::browse::{browse, LeadCard};
use crate::classifier::Classifier;
use crate::config::RadarConfig;
use crate::ingest::{self, providers::rss::sources_from_config, types::FeedSource, ScanReport};
use crate::lead::{parse_date, DATE_FMT};
use crate::normalize::local_offset;
use crate::store::LeadStore;

#[derive(Clone)]
pub struct AppState {
    config: Arc<RadarConfig>,
    classifier: Arc<Classifier>,
    store: Arc<LeadStore>,
    sources: Arc<Vec<Box<dyn FeedSource>>>,
    // one ingestion run at a time: the store has a single writer
    scan_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: RadarConfig, sources: Vec<Box<dyn FeedSource>>) -> Self {
        let classifier = Classifier::from_config(&config.classifier);
        let store = LeadStore::from_config(&config.store);
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
            store: Arc::new(store),
            sources: Arc::new(sources),
            scan_lock: Arc::new(Mutex::new(())),
        }
    }

    /// State with HTTP sources for every configured feed.
    pub fn from_config(config: RadarConfig) -> anyhow::Result<Self> {
        let sources = sources_from_config(&config.ingest)?;
        Ok(Self::new(config, sources))
    }

    fn today(&self) -> NaiveDate {
        Utc::now()
            .with_timezone(&local_offset(self.config.ingest.utc_offset_hours))
            .date_naive()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/leads", get(leads))
        .route("/scan", post(scan))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct LeadsQuery {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum BrowseStatus {
    Ok,
    NoData,
}

#[derive(Serialize)]
struct LeadsResp {
    date: String,
    status: BrowseStatus,
    cards: Vec<LeadCard>,
}

async fn leads(
    State(state): State<AppState>,
    Query(q): Query<LeadsQuery>,
) -> Result<Json<LeadsResp>, (StatusCode, String)> {
    let date = match q.date.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("invalid date `{s}`, expected YYYY-MM-DD"),
            )
        })?,
        None => state.today(),
    };

    let resp = match state.store.read_leads() {
        None => LeadsResp {
            date: date.format(DATE_FMT).to_string(),
            status: BrowseStatus::NoData,
            cards: Vec::new(),
        },
        Some(rows) => LeadsResp {
            date: date.format(DATE_FMT).to_string(),
            status: BrowseStatus::Ok,
            cards: browse(&rows, date, &state.config.browser),
        },
    };
    Ok(Json(resp))
}

async fn scan(State(state): State<AppState>) -> Result<Json<ScanReport>, (StatusCode, String)> {
    let _guard = state.scan_lock.lock().await;
    let offset = local_offset(state.config.ingest.utc_offset_hours);
    ingest::run_once(
        &state.sources,
        &state.classifier,
        &state.store,
        offset,
        Utc::now(),
    )
    .await
    .map(Json)
    .map_err(|e| {
        tracing::error!(target: "api", error = %e, "scan failed to persist");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
