// src/ingest/providers/rss.rs
//! RSS 2.0, RSS 1.0 (RDF) and Atom feeds behind one provider.
//!
//! - RSS 2.0: `rss/channel/item` with `pubDate`
//! - RSS 1.0: `rdf:RDF/item` with `dc:date`
//! - Atom:    `feed/entry` with `link@href`, `published`/`updated`

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use once_cell::sync::OnceCell;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;

use crate::config::IngestCfg;
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::normalize::clean_text;

#[derive(Debug, Deserialize)]
struct Doc {
    channel: Option<Channel>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "@about", alias = "@rdf:about")]
    about: Option<String>,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "date", alias = "dc:date")]
    dc_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl Item {
    fn into_entry(self) -> FeedEntry {
        FeedEntry {
            title: clean_text(self.title.as_deref().unwrap_or_default()),
            summary: clean_text(self.description.as_deref().unwrap_or_default()),
            link: self
                .link
                .or(self.about)
                .map(|l| l.trim().to_string())
                .unwrap_or_default(),
            published: self.pub_date.or(self.dc_date),
        }
    }
}

impl AtomEntry {
    fn into_entry(self) -> FeedEntry {
        // rel defaults to "alternate" when absent
        let link = self
            .links
            .iter()
            .find(|l| l.rel.as_deref().unwrap_or("alternate") == "alternate")
            .or_else(|| self.links.first())
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();
        FeedEntry {
            title: clean_text(self.title.as_deref().unwrap_or_default()),
            summary: clean_text(
                self.summary
                    .as_deref()
                    .or(self.content.as_deref())
                    .unwrap_or_default(),
            ),
            link,
            published: self.published.or(self.updated),
        }
    }
}

/// Parse any supported feed document into entries.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let doc: Doc = from_str(&xml_clean).context("parsing feed xml")?;

    let mut out = Vec::with_capacity(doc.items.len() + doc.entries.len());
    let channel_items = doc.channel.map(|c| c.items).unwrap_or_default();
    out.extend(
        channel_items
            .into_iter()
            .chain(doc.items)
            .map(Item::into_entry),
    );
    out.extend(doc.entries.into_iter().map(AtomEntry::into_entry));
    Ok(out)
}

pub struct RssFeed {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeed {
    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    fn parse_and_count(&self, xml: &str) -> Result<Vec<FeedEntry>> {
        let entries = parse_feed(xml).with_context(|| format!("feed `{}`", self.name))?;
        counter!("radar_entries_total").increment(entries.len() as u64);
        Ok(entries)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_and_count(xml),
            Mode::Http { url, client } => {
                let t0 = std::time::Instant::now();
                let body = client
                    .get(url.as_str())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("feed `{}` http get", self.name))?
                    .text()
                    .await
                    .with_context(|| format!("feed `{}` http body", self.name))?;
                histogram!("radar_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                self.parse_and_count(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build HTTP sources for every configured feed, sharing one client.
pub fn sources_from_config(cfg: &IngestCfg) -> Result<Vec<Box<dyn FeedSource>>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(concat!("lead-radar/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")?;

    cfg.feeds
        .iter()
        .map(|f| -> Result<Box<dyn FeedSource>> {
            let url = f.resolve_url()?;
            Ok(Box::new(RssFeed::from_url(&f.name, &url, client.clone())))
        })
        .collect()
}

/// HTML entities that are not valid XML.
/// Decode HTML named entities quick-xml would reject (`&nbsp;`, `&copy;`, ...).
/// The five XML entities are left for the XML reader.
fn scrub_html_entities_for_xml(s: &str) -> Cow<'_, str> {
    static RE_NAMED: OnceCell<Regex> = OnceCell::new();
    let re = RE_NAMED.get_or_init(|| Regex::new(r"&[A-Za-z][A-Za-z0-9]*;").expect("entity regex"));
    re.replace_all(s, |caps: &Captures| match &caps[0] {
        "&amp;" | "&lt;" | "&gt;" | "&quot;" | "&apos;" => caps[0].to_string(),
        other => html_escape::decode_html_entities(other).into_owned(),
    })
}
