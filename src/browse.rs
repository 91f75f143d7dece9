// src/browse.rs
//! Read side of the lead browser: date filter, ranking, tag highlighting.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::BrowserCfg;
use crate::lead::Lead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rank {
    S,
    A,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagView {
    pub label: String,
    pub hot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadCard {
    pub time: String,
    pub company: String,
    pub title: String,
    pub url: String,
    pub score: i32,
    pub rank: Option<Rank>,
    pub tags: Vec<TagView>,
}

pub fn rank_for(score: i32, cfg: &BrowserCfg) -> Option<Rank> {
    if score >= cfg.rank_s {
        Some(Rank::S)
    } else if score >= cfg.rank_a {
        Some(Rank::A)
    } else {
        None
    }
}

/// Cards for one date, highest score first, then latest time.
pub fn browse(leads: &[Lead], date: NaiveDate, cfg: &BrowserCfg) -> Vec<LeadCard> {
    let mut day: Vec<&Lead> = leads.iter().filter(|l| l.date == date).collect();
    day.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.time.cmp(&a.time)));

    day.into_iter()
        .map(|l| LeadCard {
            time: l.time_str(),
            company: l.company.clone(),
            title: l.title.clone(),
            url: l.url.clone(),
            score: l.score,
            rank: rank_for(l.score, cfg),
            tags: l
                .tags
                .iter()
                .map(|t| TagView {
                    label: t.clone(),
                    hot: cfg.hot_words.iter().any(|w| t.contains(w.as_str())),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{parse_date, parse_time};

    fn cfg() -> BrowserCfg {
        BrowserCfg {
            rank_s: 10,
            rank_a: 3,
            hot_words: vec!["販路".into(), "提携".into()],
        }
    }

    fn lead(date: &str, time: &str, url: &str, score: i32, tags: &[&str]) -> Lead {
        Lead {
            date: parse_date(date).unwrap(),
            time: parse_time(time).unwrap(),
            company: "X".into(),
            title: "t".into(),
            url: url.into(),
            score,
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn filters_by_exact_date_and_ranks() {
        let leads = vec![
            lead("2026-10-15", "09:00", "a", 2, &[]),
            lead("2026-10-15", "08:00", "b", 12, &["👑販路拡大", "⚡刷新"]),
            lead("2026-10-14", "23:00", "c", 50, &[]),
            lead("2026-10-15", "10:00", "d", 3, &["🤝提携"]),
        ];
        let cards = browse(&leads, parse_date("2026-10-15").unwrap(), &cfg());
        let urls: Vec<&str> = cards.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "d", "a"]);
        assert_eq!(cards[0].rank, Some(Rank::S));
        assert_eq!(cards[1].rank, Some(Rank::A));
        assert_eq!(cards[2].rank, None);
        assert!(cards[0].tags[0].hot);
        assert!(!cards[0].tags[1].hot);
    }
}
