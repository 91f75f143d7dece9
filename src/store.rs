// src/store.rs
//! Lead store: a flat CSV table deduplicated by URL.
//!
//! Every commit is read → merge → sort → overwrite of the whole file.
//! On URL collision the previously stored row wins, so a lead keeps the
//! score and tags it had when first seen.
//!
//! Canonical order after each commit: date desc, score desc, time desc.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{LegacySchema, StoreCfg};
use crate::lead::{parse_date, parse_time, split_tags, Lead};

pub const HEADER: [&str; 7] = ["date", "time", "company", "title", "url", "score", "tags"];

const BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// What was found on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Missing,
    Current(Vec<Lead>),
    /// Written before the score column existed; rows carry score 0, no tags.
    Legacy(Vec<Lead>),
    Corrupt(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Rows carried over from the prior store.
    pub previous: usize,
    pub incoming: usize,
    /// Rows written.
    pub stored: usize,
    /// Incoming rows dropped because the URL was already present.
    pub duplicates: usize,
    /// Rows dropped by the retention window.
    pub pruned: usize,
    /// Legacy rows dropped under `legacy_schema = "discard"`.
    pub discarded_legacy: usize,
}

/// Sort in canonical order: date desc, score desc, time desc.
pub fn sort_canonical(leads: &mut [Lead]) {
    leads.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.score.cmp(&a.score))
            .then_with(|| b.time.cmp(&a.time))
    });
}

/// Existing rows win: existing first, then incoming, first occurrence of a URL kept.
pub fn merge(existing: Vec<Lead>, incoming: Vec<Lead>) -> Vec<Lead> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut out = Vec::with_capacity(existing.len() + incoming.len());
    for lead in existing.into_iter().chain(incoming) {
        if seen.insert(lead.url.clone()) {
            out.push(lead);
        }
    }
    sort_canonical(&mut out);
    out
}

/// Drop rows dated before `today - days`.
pub fn prune_older_than(leads: &mut Vec<Lead>, today: NaiveDate, days: u32) -> usize {
    let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(days))) else {
        return 0;
    };
    let before = leads.len();
    leads.retain(|l| l.date >= cutoff);
    before - leads.len()
}

#[derive(Debug, Clone)]
pub struct LeadStore {
    path: PathBuf,
    legacy: LegacySchema,
    retention_days: Option<u32>,
}

impl LeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy: LegacySchema::default(),
            retention_days: None,
        }
    }

    pub fn from_config(cfg: &StoreCfg) -> Self {
        Self {
            path: cfg.path.clone(),
            legacy: cfg.legacy_schema,
            retention_days: cfg.retention_days,
        }
    }

    pub fn with_legacy_schema(mut self, legacy: LegacySchema) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn with_retention_days(mut self, days: Option<u32>) -> Self {
        self.retention_days = days;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store. Never fails: unreadable content is reported as `Corrupt`.
    pub fn load(&self) -> Snapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Snapshot::Missing,
            Err(e) => return Snapshot::Corrupt(format!("read failed: {e}")),
        };
        match parse_csv(content.strip_prefix(BOM).unwrap_or(&content)) {
            Ok(s) => s,
            Err(reason) => Snapshot::Corrupt(reason),
        }
    }

    /// Rows for display; `None` when nothing has been stored yet.
    pub fn read_leads(&self) -> Option<Vec<Lead>> {
        match self.load() {
            Snapshot::Missing => None,
            Snapshot::Current(rows) | Snapshot::Legacy(rows) => Some(rows),
            Snapshot::Corrupt(reason) => {
                tracing::warn!(
                    target: "store",
                    path = %self.path.display(),
                    %reason,
                    "corrupt store, showing nothing"
                );
                Some(Vec::new())
            }
        }
    }

    /// Merge `incoming` into the store and rewrite it. An empty batch leaves the file untouched.
    pub fn commit(&self, incoming: Vec<Lead>, today: NaiveDate) -> Result<CommitReport, StoreError> {
        let mut report = CommitReport {
            incoming: incoming.len(),
            ..CommitReport::default()
        };
        if incoming.is_empty() {
            return Ok(report);
        }

        let existing = match self.load() {
            Snapshot::Missing => Vec::new(),
            Snapshot::Current(rows) => rows,
            Snapshot::Legacy(rows) => match self.legacy {
                LegacySchema::Discard => {
                    tracing::warn!(
                        target: "store",
                        rows = rows.len(),
                        "store predates score column, discarding prior rows"
                    );
                    report.discarded_legacy = rows.len();
                    Vec::new()
                }
                LegacySchema::Upgrade => {
                    tracing::info!(target: "store", rows = rows.len(), "upgrading legacy store rows");
                    rows
                }
            },
            Snapshot::Corrupt(reason) => {
                tracing::warn!(
                    target: "store",
                    path = %self.path.display(),
                    %reason,
                    "corrupt store, starting over"
                );
                self.keep_backup();
                Vec::new()
            }
        };
        report.previous = existing.len();

        let mut merged = merge(existing, incoming);
        report.duplicates = report.previous + report.incoming - merged.len();

        if let Some(days) = self.retention_days {
            report.pruned = prune_older_than(&mut merged, today, days);
        }

        self.write_all(&merged)?;
        report.stored = merged.len();
        metrics::gauge!("radar_store_rows").set(merged.len() as f64);
        tracing::info!(
            target: "store",
            previous = report.previous,
            incoming = report.incoming,
            stored = report.stored,
            duplicates = report.duplicates,
            pruned = report.pruned,
            "store committed"
        );
        Ok(report)
    }

    /// Overwrite the file with `leads` (temp file + rename).
    pub fn write_all(&self, leads: &[Lead]) -> Result<(), StoreError> {
        let bytes = render_csv(leads)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, bytes).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Copy an unreadable store aside before it is overwritten.
    /// A failed copy is logged; the commit goes ahead.
    fn keep_backup(&self) {
        let bak = self.path.with_extension("csv.bak");
        match fs::copy(&self.path, &bak) {
            Ok(bytes) => tracing::warn!(
                target: "store",
                backup = %bak.display(),
                bytes,
                "kept copy of unreadable store"
            ),
            Err(e) => tracing::error!(
                target: "store",
                backup = %bak.display(),
                error = %e,
                "could not back up unreadable store"
            ),
        }
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn render_csv(leads: &[Lead]) -> Result<Vec<u8>, StoreError> {
    let mut buf = BOM.as_bytes().to_vec();
    {
        let mut wtr = csv::WriterBuilder::new().from_writer(&mut buf);
        wtr.write_record(HEADER)?;
        for l in leads {
            wtr.write_record([
                l.date_str(),
                l.time_str(),
                l.company.clone(),
                l.title.clone(),
                l.url.clone(),
                l.score.to_string(),
                l.tags_joined(),
            ])?;
        }
        wtr.flush().map_err(csv::Error::from)?;
    }
    Ok(buf)
}

struct Columns {
    date: usize,
    time: usize,
    company: usize,
    title: usize,
    url: usize,
    score: Option<usize>,
    tags: Option<usize>,
}

fn parse_csv(content: &str) -> Result<Snapshot, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let required = |name: &str| find(name).ok_or_else(|| format!("missing column `{name}`"));
    let cols = Columns {
        date: required("date")?,
        time: required("time")?,
        company: required("company")?,
        title: required("title")?,
        url: required("url")?,
        score: find("score"),
        tags: find("tags"),
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for rec in rdr.records() {
        let rec = rec.map_err(|e| e.to_string())?;
        let field = |i: usize| rec.get(i).unwrap_or_default();

        let (Some(date), Some(time)) = (parse_date(field(cols.date)), parse_time(field(cols.time)))
        else {
            skipped += 1;
            continue;
        };
        let url = field(cols.url).trim();
        if url.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(Lead {
            date,
            time,
            company: field(cols.company).to_string(),
            title: field(cols.title).to_string(),
            url: url.to_string(),
            score: cols
                .score
                .and_then(|i| field(i).trim().parse::<i32>().ok())
                .unwrap_or(0),
            tags: cols.tags.map(|i| split_tags(field(i))).unwrap_or_default(),
        });
    }
    if skipped > 0 {
        tracing::warn!(target: "store", skipped, "skipped rows with invalid date, time or url");
    }

    Ok(if cols.score.is_some() {
        Snapshot::Current(rows)
    } else {
        Snapshot::Legacy(rows)
    })
}
