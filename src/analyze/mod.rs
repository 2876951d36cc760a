// src/analyze/mod.rs
//! Analysis pipeline entry: scores collected posts, model first, keywords as fallback.

pub mod ai_adapter;
pub mod keywords;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::decision::{Assessment, Method};
use crate::error::Result;
use crate::ingest::types::PostRecord;
use crate::report::ReportRow;

pub use ai_adapter::ModelScorer;
pub use keywords::KeywordScorer;

/// Anything that can turn free text into an assessment.
#[async_trait::async_trait]
pub trait RiskScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<Assessment>;

    fn method(&self) -> Method;

    /// `false` when the scorer is known to fail every call.
    fn is_available(&self) -> bool {
        true
    }
}

/// Title and body as one text for scoring.
pub fn combined_text(record: &PostRecord) -> String {
    format!("{} {}", record.title, record.body_text)
}

/// Score every record with a non-empty body, preserving input order.
///
/// `primary` is tried first; any error falls back to `fallback`, which
/// cannot fail. Records with an empty body are skipped.
pub async fn analyze_all(
    records: &[PostRecord],
    primary: &dyn RiskScorer,
    fallback: &KeywordScorer,
) -> Vec<ReportRow> {
    crate::ingest::ensure_metrics_described();

    let primary_available = primary.is_available();
    info!(
        target: "analyze",
        records = records.len(),
        primary = %primary.method(),
        primary_available,
        "analysis started"
    );

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if record.body_text.trim().is_empty() {
            debug!(target: "analyze", url = %record.url, "empty body; skipped");
            continue;
        }

        let text = combined_text(record);
        let (assessment, method) = if primary_available {
            match primary.score(&text).await {
                Ok(a) => (a, primary.method()),
                Err(e) => {
                    warn!(target: "analyze", url = %record.url, error = %e, "primary scorer failed; using keywords");
                    counter!("analysis_fallback_total").increment(1);
                    (fallback.assess(&text), Method::Keyword)
                }
            }
        } else {
            (fallback.assess(&text), Method::Keyword)
        };

        if assessment.verdict.is_risky() {
            warn!(
                target: "analyze",
                item = idx + 1,
                source = %record.source,
                score = %format!("{:.2}", assessment.risk_score),
                %method,
                "risky post detected"
            );
        }

        counter!("analysis_records_total").increment(1);
        rows.push(ReportRow::new(record, assessment, method, Utc::now()));
    }

    info!(target: "analyze", scored = rows.len(), "analysis finished");
    rows
}
