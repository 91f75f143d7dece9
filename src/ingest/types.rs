// src/ingest/types.rs
use anyhow::Result;

/// One raw feed entry, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    /// Empty when the feed has no description/summary.
    pub summary: String,
    pub link: String,
    /// Raw feed timestamp (`pubDate`, `dc:date`, Atom `published`/`updated`).
    pub published: Option<String>,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &str;
}
