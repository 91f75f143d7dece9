// tests/config_load.rs
use chrono::{NaiveDate, NaiveTime};
use lead_radar::browse::browse;
use lead_radar::config::{LegacySchema, PolicyKind, RadarConfig, ENV_CONFIG_PATH, ENV_STORE_PATH};
use lead_radar::lead::Lead;
use std::{env, fs};

const BINARY_TOML: &str = r#"
[classifier]
policy = "binary"
exclusion = ["入札"]
inclusion = ["資金調達"]
business_context = ["SaaS"]

[store]
path = "leads.csv"
legacy_schema = "upgrade"
retention_days = 90
"#;

#[test]
fn minimal_file_gets_defaults() {
    let cfg = RadarConfig::from_toml_str(BINARY_TOML).unwrap();
    assert_eq!(cfg.classifier.policy, PolicyKind::Binary);
    assert_eq!(cfg.store.legacy_schema, LegacySchema::Upgrade);
    assert_eq!(cfg.store.retention_days, Some(90));
    assert_eq!(cfg.ingest.utc_offset_hours, 9);
    assert!(cfg.ingest.feeds.is_empty());
    assert_eq!(cfg.browser.rank_s, 10);
    assert_eq!(cfg.browser.rank_a, 3);
    assert_eq!(cfg.browser.hot_words, ["販路", "資金", "採用", "新規", "提携"]);
}

#[test]
fn missing_browser_section_still_highlights_hot_tags() {
    let cfg = RadarConfig::from_toml_str(BINARY_TOML).unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
    let lead = Lead {
        date,
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        company: "A社".into(),
        title: "A社、販路拡大を発表".into(),
        url: "https://example.com/a".into(),
        score: 10,
        tags: vec!["👑販路拡大".into(), "🤝OEM".into()],
    };
    let cards = browse(&[lead], date, &cfg.browser);
    assert_eq!(cards.len(), 1);
    assert!(cards[0].tags[0].hot);
    assert!(!cards[0].tags[1].hot);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_STORE_PATH);

    // 1) nothing on disk -> built-in tables
    let v = RadarConfig::load_default().unwrap();
    assert_eq!(v.classifier.policy, PolicyKind::Scoring);

    // 2) ./config/radar.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/radar.toml"), BINARY_TOML).unwrap();
    let v = RadarConfig::load_default().unwrap();
    assert_eq!(v.classifier.policy, PolicyKind::Binary);

    // 3) env path wins, store path override applies
    let p = tmp.path().join("other.toml");
    fs::write(&p, BINARY_TOML.replace("leads.csv", "other.csv")).unwrap();
    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    env::set_var(ENV_STORE_PATH, "/tmp/override.csv");
    let v = RadarConfig::load_default().unwrap();
    assert_eq!(v.store.path, std::path::PathBuf::from("/tmp/override.csv"));

    // 4) env pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(RadarConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_STORE_PATH);
    env::set_current_dir(&old).unwrap();
}
