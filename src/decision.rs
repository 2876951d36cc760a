//! Verdict, scoring method, and the per-post assessment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary classification of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Risky,
    NotRisky,
}

impl Verdict {
    /// `Risky` iff `score >= threshold`.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Verdict::Risky
        } else {
            Verdict::NotRisky
        }
    }

    pub fn is_risky(self) -> bool {
        self == Verdict::Risky
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Risky => "risky",
            Verdict::NotRisky => "not-risky",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scorer produced the final assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Model,
    Keyword,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Model => "model",
            Method::Keyword => "keyword",
        })
    }
}

/// Score, verdict and rationale for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Always in `[0.0, 1.0]`.
    pub risk_score: f64,
    pub verdict: Verdict,
    pub rationale: String,
}

impl Assessment {
    pub fn new(risk_score: f64, verdict: Verdict, rationale: impl Into<String>) -> Self {
        let risk_score = if risk_score.is_nan() {
            0.0
        } else {
            risk_score.clamp(0.0, 1.0)
        };
        Self {
            risk_score,
            verdict,
            rationale: rationale.into(),
        }
    }
}

impl Default for Assessment {
    fn default() -> Self {
        Self {
            risk_score: 0.0,
            verdict: Verdict::NotRisky,
            rationale: String::new(),
        }
    }
}
