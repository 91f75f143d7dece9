// src/normalize.rs
//! Entry normalization: text cleanup, company label, timestamp resolution.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

/// Max characters kept in a company label.
pub const COMPANY_MAX_CHARS: usize = 20;

/// Bracket and quote characters blanked out of titles.
const STRIP_CHARS: [char; 10] = ['【', '】', '「', '」', '『', '』', '(', ')', '（', '）'];

/// Subject-marking delimiters, applied in order; the first segment is kept.
const SUBJECT_DELIMITERS: [&str; 3] = ["が", "の", "、"];

/// Decode entities, strip HTML tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Best-effort display label for the company a title is about.
pub fn company_label(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if STRIP_CHARS.contains(&c) { ' ' } else { c })
        .collect();

    let mut head = cleaned.as_str();
    for d in SUBJECT_DELIMITERS {
        head = head.split(d).next().unwrap_or_default();
    }
    head.trim().chars().take(COMPANY_MAX_CHARS).collect()
}

/// Parse a feed timestamp: RFC 2822 (`pubDate`) or RFC 3339 (`dc:date`, Atom).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let odt = OffsetDateTime::parse(raw, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()?;
    DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

/// Fixed local offset from whole hours; falls back to UTC if out of range.
pub fn local_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Feed time when present and parseable, otherwise capture time; both in `offset`.
pub fn resolve_timestamp(
    published: Option<&str>,
    captured_at: DateTime<Utc>,
    offset: FixedOffset,
) -> DateTime<FixedOffset> {
    let parsed = published.and_then(|raw| {
        let p = parse_published(raw);
        if p.is_none() {
            tracing::debug!(target: "ingest", raw, "unparseable feed timestamp, using capture time");
        }
        p
    });
    parsed.unwrap_or(captured_at).with_timezone(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn company_from_bracketed_title() {
        assert_eq!(company_label("A社、販路拡大を発表"), "A社");
        assert_eq!(company_label("【速報】B社が資金調達"), "速報 B社");
        assert_eq!(company_label("「C社」の新サービス"), "C社");
    }

    #[test]
    fn company_is_truncated_by_chars() {
        let long = "あ".repeat(30);
        let got = company_label(&long);
        assert_eq!(got.chars().count(), COMPANY_MAX_CHARS);
    }

    #[test]
    fn clean_text_strips_markup() {
        let s = "<a href=\"x\">A社&nbsp;が</a>\n\n  提携 &amp; 協業";
        assert_eq!(clean_text(s), "A社 が 提携 & 協業");
    }

    #[test]
    fn rfc2822_and_rfc3339_parse() {
        let a = parse_published("Wed, 14 Oct 2026 01:30:00 +0000").unwrap();
        let b = parse_published("2026-10-14T10:30:00+09:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_published("yesterday-ish").is_none());
        assert!(parse_published("").is_none());
    }

    #[test]
    fn timestamp_prefers_feed_then_capture() {
        let jst = local_offset(9);
        let captured = Utc.with_ymd_and_hms(2026, 10, 15, 3, 0, 0).unwrap();

        let from_feed = resolve_timestamp(Some("Wed, 14 Oct 2026 16:10:00 +0000"), captured, jst);
        assert_eq!(from_feed.format("%Y-%m-%d %H:%M").to_string(), "2026-10-15 01:10");

        let fallback = resolve_timestamp(Some("garbage"), captured, jst);
        assert_eq!(fallback.format("%Y-%m-%d %H:%M").to_string(), "2026-10-15 12:00");

        let missing = resolve_timestamp(None, captured, jst);
        assert_eq!(missing, fallback);
    }
}
