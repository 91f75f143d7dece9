// tests/ingest_pipeline.rs
//
// Full run over fixture feeds: fetch -> classify -> normalize -> commit.

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use lead_radar::classifier::Classifier;
use lead_radar::config::RadarConfig;
use lead_radar::ingest::providers::rss::RssFeed;
use lead_radar::ingest::run_once;
use lead_radar::ingest::types::{FeedEntry, FeedSource};
use lead_radar::normalize::local_offset;
use lead_radar::store::{LeadStore, Snapshot};

const PRTIMES_RDF: &str = include_str!("fixtures/prtimes_index.rdf");
const GOOGLE_RSS: &str = include_str!("fixtures/google_news_rss.xml");
const ATOM: &str = include_str!("fixtures/atom_feed.xml");

struct Unreachable;

#[async_trait::async_trait]
impl FeedSource for Unreachable {
    async fn fetch_entries(&self) -> anyhow::Result<Vec<FeedEntry>> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &str {
        "unreachable"
    }
}

fn sources() -> Vec<Box<dyn FeedSource>> {
    vec![
        Box::new(RssFeed::from_fixture("prtimes", PRTIMES_RDF)),
        Box::new(Unreachable),
        Box::new(RssFeed::from_fixture("news:業務提携", GOOGLE_RSS)),
        Box::new(RssFeed::from_fixture("atom", ATOM)),
    ]
}

fn classifier() -> Classifier {
    Classifier::from_config(&RadarConfig::builtin().unwrap().classifier)
}

fn captured() -> DateTime<Utc> {
    // 2026-10-15 09:30 JST
    Utc.with_ymd_and_hms(2026, 10, 15, 0, 30, 0).unwrap()
}

#[tokio::test]
async fn failing_source_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = LeadStore::new(dir.path().join("news_database.csv"));

    let report = run_once(&sources(), &classifier(), &store, local_offset(9), captured())
        .await
        .expect("store write ok");

    assert_eq!(report.sources_ok, 3);
    assert_eq!(report.sources_failed, vec!["unreachable".to_string()]);
    assert_eq!(report.entries, 9);
    assert_eq!(report.excluded, 1);
    assert_eq!(report.accepted, 5);
    assert_eq!(report.batch_duplicates, 1);
    assert_eq!(report.store.stored, 5);

    let rows = match store.load() {
        Snapshot::Current(rows) => rows,
        other => panic!("unexpected snapshot {other:?}"),
    };
    let order: Vec<(String, String, i32)> = rows
        .iter()
        .map(|l| (l.date_str(), l.time_str(), l.score))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2026-10-15".to_string(), "09:30".to_string(), 3),
            ("2026-10-14".to_string(), "10:00".to_string(), 20),
            ("2026-10-14".to_string(), "15:30".to_string(), 10),
            ("2026-10-14".to_string(), "12:00".to_string(), 2),
            ("2026-10-13".to_string(), "18:15".to_string(), 2),
        ]
    );

    // unparseable pubDate fell back to capture time
    assert_eq!(rows[0].company, "イプシロン社");
    // first source wins inside one batch
    assert_eq!(
        rows[1].title,
        "【プレスリリース】株式会社アルファが販売代理店の募集を開始"
    );
    assert_eq!(rows[1].company, "プレスリリース 株式会社アルファ");
    assert!(rows[1].tags.contains(&"👑販売代理店".to_string()));
    assert!(rows[1].tags.contains(&"👑代理店募集".to_string()));
    assert!(!rows.iter().any(|l| l.title.contains("市役所")));
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LeadStore::new(dir.path().join("db.csv"));
    let c = classifier();

    run_once(&sources(), &c, &store, local_offset(9), captured())
        .await
        .unwrap();
    let later = captured() + chrono::Duration::hours(5);
    let report = run_once(&sources(), &c, &store, local_offset(9), later)
        .await
        .unwrap();

    assert_eq!(report.store.previous, 5);
    assert_eq!(report.store.duplicates, 5);
    assert_eq!(report.store.stored, 5);

    // the capture-time lead keeps its first-seen timestamp
    let Snapshot::Current(rows) = store.load() else {
        panic!("expected current store");
    };
    assert_eq!(rows[0].time_str(), "09:30");
}

#[tokio::test]
async fn all_sources_down_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.csv");
    let store = LeadStore::new(&path);
    let down: Vec<Box<dyn FeedSource>> = vec![Box::new(Unreachable), Box::new(Unreachable)];

    let report = run_once(&down, &classifier(), &store, local_offset(9), captured())
        .await
        .unwrap();

    assert_eq!(report.sources_failed.len(), 2);
    assert_eq!(report.accepted, 0);
    assert!(!path.exists());
}
