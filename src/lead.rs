// src/lead.rs
//! One accepted news item with its derived score and tags.

use chrono::{NaiveDate, NaiveTime, Timelike};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const TIME_FMT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub date: NaiveDate,
    /// Minute precision; seconds are always zero.
    pub time: NaiveTime,
    pub company: String,
    pub title: String,
    /// Deduplication key.
    pub url: String,
    pub score: i32,
    pub tags: Vec<String>,
}

impl Lead {
    pub fn date_str(&self) -> String {
        self.date.format(DATE_FMT).to_string()
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FMT).to_string()
    }

    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }
}

/// Truncate a time to hour:minute.
pub fn to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT).ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), TIME_FMT).ok()
}

/// Split a comma-joined tag column; empty pieces and repeats are dropped.
pub fn split_tags(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}
