// src/analyze/keywords.rs
//! Marker-phrase scorer used whenever the model scorer is unavailable or fails.
//!
//! Every marker phrase found in the text (case-insensitive substring) adds
//! its weight: 0.4 for the high-severity subset, 0.1 for the rest. The sum
//! is capped at 1.0. An occurrence that lies entirely inside an occurrence
//! of a longer marker (자살 inside 자살방법) is not counted on its own.

use async_trait::async_trait;

use crate::analyze::RiskScorer;
use crate::config::DEFAULT_RISK_THRESHOLD;
use crate::decision::{Assessment, Method, Verdict};
use crate::error::Result;

pub const BROAD_WEIGHT: f64 = 0.1;
pub const HIGH_SEVERITY_WEIGHT: f64 = 0.4;

pub const NO_MARKERS_RATIONALE: &str = "위험 키워드 미감지";
const MATCHED_PREFIX: &str = "감지된 키워드: ";

/// Scanned in this order; the rationale lists matches in the same order.
pub const MARKER_PHRASES: [&str; 22] = [
    "자살",
    "죽고싶",
    "자해",
    "목숨",
    "극단적선택",
    "생을마감",
    "죽는방법",
    "자살방법",
    "동반자살",
    "투신",
    "목매기",
    "자살사이트",
    "자살카페",
    "같이죽",
    "함께죽",
    "자살동반",
    "우울",
    "절망",
    "포기",
    "의미없",
    "힘들",
    "괴로",
];

/// Weighted 0.4 instead of 0.1. 자살도구 is listed but not in
/// `MARKER_PHRASES`, so it is never scanned.
pub const HIGH_SEVERITY_PHRASES: [&str; 9] = [
    "자살방법",
    "동반자살",
    "같이죽",
    "함께죽",
    "자살동반",
    "죽는방법",
    "자살카페",
    "자살사이트",
    "자살도구",
];

#[derive(Debug, Clone)]
pub struct KeywordScorer {
    threshold: f64,
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_THRESHOLD)
    }
}

impl KeywordScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn weight(phrase: &str) -> f64 {
        if HIGH_SEVERITY_PHRASES.iter().any(|p| *p == phrase) {
            HIGH_SEVERITY_WEIGHT
        } else {
            BROAD_WEIGHT
        }
    }

    /// Marker phrases present in `text`, in `MARKER_PHRASES` order.
    pub fn matched_markers(&self, text: &str) -> Vec<&'static str> {
        let lowered = text.to_lowercase();

        let spans: Vec<(usize, usize, &'static str)> = MARKER_PHRASES
            .iter()
            .flat_map(|phrase| {
                lowered
                    .match_indices(phrase)
                    .map(move |(start, m)| (start, start + m.len(), *phrase))
            })
            .collect();

        let subsumed = |start: usize, end: usize, phrase: &str| {
            spans.iter().any(|&(s, e, other)| {
                other.len() > phrase.len() && s <= start && end <= e
            })
        };

        MARKER_PHRASES
            .iter()
            .copied()
            .filter(|phrase| {
                spans
                    .iter()
                    .any(|&(s, e, p)| p == *phrase && !subsumed(s, e, p))
            })
            .collect()
    }

    /// Deterministic and infallible.
    pub fn assess(&self, text: &str) -> Assessment {
        let found = self.matched_markers(text);
        let raw: f64 = found.iter().map(|p| Self::weight(p)).sum();
        // Round away float noise so three broad markers land exactly on 0.3.
        let score = ((raw * 1000.0).round() / 1000.0).min(1.0);

        let rationale = if found.is_empty() {
            NO_MARKERS_RATIONALE.to_string()
        } else {
            format!("{MATCHED_PREFIX}{}", found.join(", "))
        };

        Assessment::new(score, Verdict::from_score(score, self.threshold), rationale)
    }
}

#[async_trait]
impl RiskScorer for KeywordScorer {
    async fn score(&self, text: &str) -> Result<Assessment> {
        Ok(self.assess(text))
    }

    fn method(&self) -> Method {
        Method::Keyword
    }
}
