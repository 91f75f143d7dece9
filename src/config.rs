// src/config.rs
//! Radar configuration (`config/radar.toml`).
//!
//! Resolution order:
//! 1) `$RADAR_CONFIG_PATH` (must point to an existing file)
//! 2) `config/radar.toml` relative to the working directory
//! 3) the built-in copy of `config/radar.toml` embedded at compile time
//!
//! `$RADAR_STORE_PATH` overrides `store.path` after loading.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/radar.toml";
pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const ENV_STORE_PATH: &str = "RADAR_STORE_PATH";

const BUILTIN_TOML: &str = include_str!("../config/radar.toml");

const GOOGLE_NEWS_SEARCH: &str = "https://news.google.com/rss/search";

#[derive(Debug, Clone, Deserialize)]
pub struct RadarConfig {
    pub classifier: ClassifierCfg,
    #[serde(default)]
    pub ingest: IngestCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub browser: BrowserCfg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Binary,
    Scoring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierCfg {
    pub policy: PolicyKind,
    #[serde(default)]
    pub threshold: i32,
    #[serde(default)]
    pub exclusion: Vec<String>,
    #[serde(default)]
    pub inclusion: Vec<String>,
    #[serde(default)]
    pub business_context: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCfg {
    pub id: String,
    #[serde(default)]
    pub glyph: String,
    pub weight: i32,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestCfg {
    #[serde(default = "default_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub feeds: Vec<FeedCfg>,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_offset_hours(),
            timeout_secs: default_timeout_secs(),
            feeds: Vec::new(),
        }
    }
}

fn default_offset_hours() -> i32 {
    9
}

fn default_timeout_secs() -> u64 {
    20
}

/// One feed: either a literal `url` or a news search `query`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedCfg {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl FeedCfg {
    /// Resolve to the URL that is actually fetched.
    pub fn resolve_url(&self) -> Result<String> {
        match (&self.url, &self.query) {
            (Some(u), None) => Ok(u.clone()),
            (None, Some(q)) => {
                let url = reqwest::Url::parse_with_params(
                    GOOGLE_NEWS_SEARCH,
                    &[("q", q.as_str()), ("hl", "ja"), ("gl", "JP"), ("ceid", "JP:ja")],
                )
                .with_context(|| format!("feed `{}`: building search url", self.name))?;
                Ok(url.to_string())
            }
            _ => Err(anyhow!(
                "feed `{}` must set exactly one of `url` or `query`",
                self.name
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacySchema {
    /// Drop every prior row when the store predates the score column.
    #[default]
    Discard,
    /// Keep prior rows with score 0 and no tags.
    Upgrade,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreCfg {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub legacy_schema: LegacySchema,
    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            legacy_schema: LegacySchema::default(),
            retention_days: None,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/news_database.csv")
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserCfg {
    #[serde(default = "default_rank_s")]
    pub rank_s: i32,
    #[serde(default = "default_rank_a")]
    pub rank_a: i32,
    #[serde(default = "default_hot_words")]
    pub hot_words: Vec<String>,
}

impl Default for BrowserCfg {
    fn default() -> Self {
        Self {
            rank_s: default_rank_s(),
            rank_a: default_rank_a(),
            hot_words: default_hot_words(),
        }
    }
}

fn default_rank_s() -> i32 {
    10
}

fn default_rank_a() -> i32 {
    3
}

fn default_hot_words() -> Vec<String> {
    ["販路", "資金", "採用", "新規", "提携"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl RadarConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RadarConfig = toml::from_str(s).context("parsing radar config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading radar config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("loading radar config from {}", path.display()))
    }

    /// The configuration shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TOML)
    }

    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!(
                    "{} points to non-existent path {}",
                    ENV_CONFIG_PATH,
                    pb.display()
                );
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                tracing::info!(target: "config", "no config file found, using built-in tables");
                Self::builtin()?
            }
        };

        if let Ok(p) = std::env::var(ENV_STORE_PATH) {
            if !p.trim().is_empty() {
                cfg.store.path = PathBuf::from(p.trim());
            }
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        check_keywords("exclusion", &c.exclusion)?;
        check_keywords("inclusion", &c.inclusion)?;
        check_keywords("business_context", &c.business_context)?;

        let mut ids = HashSet::new();
        for cat in &c.categories {
            if !ids.insert(cat.id.as_str()) {
                bail!("duplicate category id `{}`", cat.id);
            }
            check_keywords(&format!("category `{}`", cat.id), &cat.keywords)?;
        }

        if c.policy == PolicyKind::Scoring && c.categories.is_empty() {
            bail!("scoring policy needs at least one category");
        }
        if c.policy == PolicyKind::Binary && (c.inclusion.is_empty() || c.business_context.is_empty())
        {
            bail!("binary policy needs non-empty `inclusion` and `business_context` lists");
        }

        if !(-23..=23).contains(&self.ingest.utc_offset_hours) {
            bail!(
                "utc_offset_hours out of range: {}",
                self.ingest.utc_offset_hours
            );
        }
        for f in &self.ingest.feeds {
            f.resolve_url()?;
        }
        Ok(())
    }
}

fn check_keywords(list: &str, words: &[String]) -> Result<()> {
    for w in words {
        if w.trim().is_empty() {
            bail!("{list}: empty keyword");
        }
        if w.contains(',') {
            bail!("{list}: keyword `{w}` must not contain ','");
        }
    }
    Ok(())
}
