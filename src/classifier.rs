// src/classifier.rs
//! Keyword classifier: static keyword tables turned into an accept decision.
//!
//! Text is `title + summary`, lower-cased; keywords are lower-cased once at
//! compile time. Matching is plain substring containment.
//!
//! Two policies share the exclusion pass:
//! - binary:  accept iff ≥1 inclusion keyword AND ≥1 business-context keyword
//! - scoring: every distinct keyword hit adds `glyph+keyword` to the tags and
//!   the category weight to the score; accept iff `score > threshold`
//!
//! Score accumulates once per distinct matched keyword per category. Repeated
//! occurrences of a keyword in the text do not compound.

use crate::config::{ClassifierCfg, PolicyKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub accepted: bool,
    pub score: i32,
    pub tags: Vec<String>,
    /// The exclusion keyword that rejected the text, if any.
    pub excluded_by: Option<String>,
}

#[derive(Debug, Clone)]
struct Keyword {
    raw: String,
    lower: String,
}

impl Keyword {
    fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let lower = raw.to_lowercase();
        Self { raw, lower }
    }
}

fn compile_list(words: &[String]) -> Vec<Keyword> {
    let mut out: Vec<Keyword> = Vec::with_capacity(words.len());
    for w in words {
        let k = Keyword::new(w);
        if !out.iter().any(|x| x.lower == k.lower) {
            out.push(k);
        }
    }
    out
}

#[derive(Debug, Clone)]
struct Category {
    id: String,
    glyph: String,
    weight: i32,
    keywords: Vec<Keyword>,
}

#[derive(Debug, Clone)]
enum Policy {
    Binary {
        inclusion: Vec<Keyword>,
        business_context: Vec<Keyword>,
    },
    Scoring {
        categories: Vec<Category>,
        threshold: i32,
    },
}

#[derive(Debug, Clone)]
pub struct Classifier {
    exclusion: Vec<Keyword>,
    policy: Policy,
}

impl Classifier {
    pub fn from_config(cfg: &ClassifierCfg) -> Self {
        let policy = match cfg.policy {
            PolicyKind::Binary => Policy::Binary {
                inclusion: compile_list(&cfg.inclusion),
                business_context: compile_list(&cfg.business_context),
            },
            PolicyKind::Scoring => Policy::Scoring {
                categories: cfg
                    .categories
                    .iter()
                    .map(|c| Category {
                        id: c.id.clone(),
                        glyph: c.glyph.clone(),
                        weight: c.weight,
                        keywords: compile_list(&c.keywords),
                    })
                    .collect(),
                threshold: cfg.threshold,
            },
        };
        Self {
            exclusion: compile_list(&cfg.exclusion),
            policy,
        }
    }

    pub fn policy_kind(&self) -> PolicyKind {
        match self.policy {
            Policy::Binary { .. } => PolicyKind::Binary,
            Policy::Scoring { .. } => PolicyKind::Scoring,
        }
    }

    /// Classify one entry. Missing summary is passed as `""`.
    pub fn classify(&self, title: &str, summary: &str) -> Decision {
        let text = combined_lower(title, summary);

        if let Some(k) = self.exclusion_hit(&text) {
            tracing::trace!(target: "classifier", keyword = %k, "excluded");
            return Decision {
                excluded_by: Some(k.to_string()),
                ..Decision::default()
            };
        }

        match &self.policy {
            Policy::Binary {
                inclusion,
                business_context,
            } => Decision {
                accepted: any_hit(&text, inclusion) && any_hit(&text, business_context),
                ..Decision::default()
            },
            Policy::Scoring {
                categories,
                threshold,
            } => {
                let (score, tags) = score_categories(&text, categories);
                Decision {
                    accepted: score > *threshold,
                    score,
                    tags,
                    excluded_by: None,
                }
            }
        }
    }

    fn exclusion_hit(&self, lower_text: &str) -> Option<&str> {
        self.exclusion
            .iter()
            .find(|k| lower_text.contains(k.lower.as_str()))
            .map(|k| k.raw.as_str())
    }
}

fn combined_lower(title: &str, summary: &str) -> String {
    let mut s = String::with_capacity(title.len() + summary.len());
    s.push_str(title);
    s.push_str(summary);
    s.to_lowercase()
}

fn any_hit(lower_text: &str, words: &[Keyword]) -> bool {
    words.iter().any(|k| lower_text.contains(k.lower.as_str()))
}

fn score_categories(lower_text: &str, categories: &[Category]) -> (i32, Vec<String>) {
    let mut score = 0i32;
    let mut tags: Vec<String> = Vec::new();
    for cat in categories {
        let mut hits = 0usize;
        for k in &cat.keywords {
            if lower_text.contains(k.lower.as_str()) {
                hits += 1;
                score = score.saturating_add(cat.weight);
                let tag = format!("{}{}", cat.glyph, k.raw);
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        if hits > 0 {
            tracing::trace!(target: "classifier", category = %cat.id, hits, "category matched");
        }
    }
    (score, tags)
}
