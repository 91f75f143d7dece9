// src/ingest/mod.rs
pub mod providers;
pub mod types;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::HashSet;

use crate::classifier::Classifier;
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::lead::{to_minute, Lead};
use crate::normalize::{company_label, resolve_timestamp};
use crate::store::{CommitReport, LeadStore, StoreError};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_entries_total", "Feed entries parsed from sources.");
        describe_counter!(
            "radar_excluded_total",
            "Entries rejected by an exclusion keyword."
        );
        describe_counter!("radar_accepted_total", "Entries accepted as leads.");
        describe_counter!(
            "radar_feed_errors_total",
            "Feed fetch/parse errors (source skipped)."
        );
        describe_counter!("radar_scans_total", "Completed ingestion runs.");
        describe_histogram!("radar_fetch_ms", "Feed fetch time in milliseconds.");
        describe_gauge!("radar_store_rows", "Rows in the lead store after the last commit.");
        describe_gauge!("radar_last_scan_ts", "Unix ts of the last ingestion run.");
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub sources_ok: usize,
    pub sources_failed: Vec<String>,
    pub entries: usize,
    /// Entries without a link (no dedup key).
    pub skipped: usize,
    pub excluded: usize,
    pub accepted: usize,
    /// Accepted entries repeating a URL already seen in this run.
    pub batch_duplicates: usize,
    pub store: CommitReport,
}

/// Turn an accepted entry into a lead.
pub fn build_lead(
    entry: &FeedEntry,
    score: i32,
    tags: Vec<String>,
    captured_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Lead {
    let ts = resolve_timestamp(entry.published.as_deref(), captured_at, offset);
    Lead {
        date: ts.date_naive(),
        time: to_minute(ts.time()),
        company: company_label(&entry.title),
        title: entry.title.clone(),
        url: entry.link.clone(),
        score,
        tags,
    }
}

/// Classify entries and build leads; the first occurrence of a URL wins.
/// Returns (leads, skipped, excluded, batch_duplicates).
pub fn classify_entries(
    entries: &[FeedEntry],
    classifier: &Classifier,
    captured_at: DateTime<Utc>,
    offset: FixedOffset,
) -> (Vec<Lead>, usize, usize, usize) {
    let mut leads = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let (mut skipped, mut excluded, mut dups) = (0usize, 0usize, 0usize);

    for e in entries {
        if e.link.is_empty() {
            skipped += 1;
            continue;
        }
        let d = classifier.classify(&e.title, &e.summary);
        if d.excluded_by.is_some() {
            excluded += 1;
            continue;
        }
        if !d.accepted {
            continue;
        }
        if !seen.insert(e.link.as_str()) {
            dups += 1;
            continue;
        }
        leads.push(build_lead(e, d.score, d.tags, captured_at, offset));
    }
    (leads, skipped, excluded, dups)
}

/// Run one ingestion pass: fetch every source in order, classify, commit.
///
/// A failing source is logged and skipped. Only a failed store write aborts
/// the run; in that case nothing from this run is persisted.
pub async fn run_once(
    sources: &[Box<dyn FeedSource>],
    classifier: &Classifier,
    store: &LeadStore,
    offset: FixedOffset,
    captured_at: DateTime<Utc>,
) -> Result<ScanReport, StoreError> {
    ensure_metrics_described();

    let mut report = ScanReport::default();
    let mut raw = Vec::new();
    for s in sources {
        match s.fetch_entries().await {
            Ok(mut v) => {
                tracing::debug!(target: "ingest", source = s.name(), entries = v.len(), "source fetched");
                report.sources_ok += 1;
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = s.name(), "source error");
                counter!("radar_feed_errors_total").increment(1);
                report.sources_failed.push(s.name().to_string());
            }
        }
    }
    report.entries = raw.len();

    let (leads, skipped, excluded, dups) = classify_entries(&raw, classifier, captured_at, offset);
    report.skipped = skipped;
    report.excluded = excluded;
    report.accepted = leads.len();
    report.batch_duplicates = dups;

    counter!("radar_excluded_total").increment(excluded as u64);
    counter!("radar_accepted_total").increment(leads.len() as u64);

    let today = captured_at.with_timezone(&offset).date_naive();
    report.store = store.commit(leads, today)?;

    counter!("radar_scans_total").increment(1);
    gauge!("radar_last_scan_ts").set(captured_at.timestamp() as f64);

    tracing::info!(
        target: "ingest",
        policy = ?classifier.policy_kind(),
        sources_ok = report.sources_ok,
        sources_failed = report.sources_failed.len(),
        entries = report.entries,
        excluded = report.excluded,
        accepted = report.accepted,
        stored = report.store.stored,
        "scan finished"
    );
    Ok(report)
}
