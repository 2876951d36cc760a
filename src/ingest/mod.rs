// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{DateRange, SourceAdapter};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

pub use types::{Platform, PostRecord};

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collect_records_total",
            "Records returned by source adapters."
        );
        describe_counter!(
            "collect_errors_total",
            "Skipped pages/items and failed source calls."
        );
        describe_counter!(
            "analysis_records_total",
            "Records scored by the analysis pipeline."
        );
        describe_counter!(
            "analysis_fallback_total",
            "Records scored by keywords after the model scorer failed."
        );
    });
}

/// Normalize upstream text: strip tags, decode entities, collapse whitespace,
/// trim, then cap at `max_chars` characters.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?s)<[^>]+>").unwrap());
    let out = re_tags.replace_all(s, "");

    let out = html_escape::decode_html_entities(&out);

    // Entities html-escape does not know about become a plain space.
    static RE_ENT: OnceCell<regex::Regex> = OnceCell::new();
    let re_ent = RE_ENT.get_or_init(|| regex::Regex::new(r"&[a-zA-Z0-9#]+;").unwrap());
    let out = re_ent.replace_all(&out, " ");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    let out = re_ws.replace_all(&out, " ");

    let trimmed = out.trim();
    if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect()
    } else {
        trimmed.to_string()
    }
}

/// A selected source together with how many records to ask it for.
pub struct SourcePlan {
    pub adapter: Box<dyn SourceAdapter>,
    pub target_count: usize,
}

impl SourcePlan {
    pub fn new(adapter: Box<dyn SourceAdapter>, target_count: usize) -> Self {
        Self {
            adapter,
            target_count,
        }
    }
}

/// Query every plan for every keyword, in order, and concatenate the results.
/// A failing keyword/source pair contributes nothing; the rest still runs.
pub async fn collect_all(
    keywords: &[String],
    plans: &[SourcePlan],
    range: Option<DateRange>,
) -> Vec<PostRecord> {
    ensure_metrics_described();

    let mut all = Vec::new();
    for keyword in keywords {
        info!(target: "ingest", %keyword, sources = plans.len(), "searching keyword");
        for plan in plans {
            let platform = plan.adapter.platform();
            match plan
                .adapter
                .collect(keyword, plan.target_count, range)
                .await
            {
                Ok(mut records) => {
                    // Adapters promise this already; keep the bound even for a misbehaving one.
                    records.truncate(plan.target_count);
                    info!(
                        target: "ingest",
                        %keyword,
                        %platform,
                        target = plan.target_count,
                        collected = records.len(),
                        "source finished"
                    );
                    counter!("collect_records_total").increment(records.len() as u64);
                    all.append(&mut records);
                }
                Err(e) => {
                    warn!(target: "ingest", %keyword, %platform, error = %e, "source failed; skipping");
                    counter!("collect_errors_total").increment(1);
                }
            }
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <b>죽고싶</b>&nbsp;&nbsp;다 &quot;정말&quot;\n\t끝 ";
        assert_eq!(normalize_text(s, 1000), "죽고싶 다 \"정말\" 끝");
    }

    #[test]
    fn unknown_entities_become_spaces() {
        assert_eq!(normalize_text("a&zzbogus;b", 100), "a b");
    }

    #[test]
    fn truncates_by_chars_not_bytes() {
        let s = "가".repeat(20);
        let out = normalize_text(&s, 5);
        assert_eq!(out.chars().count(), 5);
    }
}
