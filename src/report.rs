// src/report.rs
//! CSV report (UTF-8 with BOM so spreadsheet apps pick the encoding) plus
//! per-source statistics.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::decision::{Assessment, Method, Verdict};
use crate::ingest::types::{Platform, PostRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
/// Body text is shortened to this many chars in the report.
const REPORT_BODY_CHARS: usize = 500;

/// One analyzed post: the record, its assessment, and when it was scored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub collected_at: DateTime<Utc>,
    pub source: Platform,
    pub url: String,
    pub title: String,
    pub body_text: String,
    pub search_keyword: String,
    pub created_at: Option<DateTime<Utc>>,
    pub fetch_succeeded: bool,
    pub author: Option<String>,
    pub risk_score: f64,
    pub verdict: Verdict,
    pub rationale: String,
    pub method: Method,
}

impl ReportRow {
    pub fn new(
        record: &PostRecord,
        assessment: Assessment,
        method: Method,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            collected_at,
            source: record.source,
            url: record.url.clone(),
            title: record.title.clone(),
            body_text: record.body_text.clone(),
            search_keyword: record.search_keyword.clone(),
            created_at: record.created_at,
            fetch_succeeded: record.fetch_succeeded,
            author: record.author.clone(),
            risk_score: assessment.risk_score,
            verdict: assessment.verdict,
            rationale: assessment.rationale,
            method,
        }
    }
}

/// Flat, string-formatted view written to the CSV. Field order is the column order.
#[derive(Serialize)]
struct CsvRecord<'a> {
    collected_at: String,
    source: &'a str,
    url: &'a str,
    title: &'a str,
    body_text: String,
    search_keyword: &'a str,
    created_at: String,
    fetch_succeeded: bool,
    author: &'a str,
    risk_score: String,
    verdict: &'a str,
    rationale: &'a str,
    method: String,
}

fn shorten(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}

impl<'a> From<&'a ReportRow> for CsvRecord<'a> {
    fn from(row: &'a ReportRow) -> Self {
        let ts = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            collected_at: ts(row.collected_at),
            source: row.source.display_name(),
            url: &row.url,
            title: &row.title,
            body_text: shorten(&row.body_text, REPORT_BODY_CHARS),
            search_keyword: &row.search_keyword,
            created_at: row.created_at.map(ts).unwrap_or_default(),
            fetch_succeeded: row.fetch_succeeded,
            author: row.author.as_deref().unwrap_or_default(),
            risk_score: format!("{:.2}", row.risk_score),
            verdict: row.verdict.as_str(),
            rationale: &row.rationale,
            method: row.method.to_string(),
        }
    }
}

/// `suicide_monitoring_result_YYYYmmdd_HHMMSS.csv`
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!(
        "suicide_monitoring_result_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Write rows into a timestamped file under `output_dir`.
/// Empty input writes nothing and returns `Ok(None)`.
pub fn write_report(rows: &[ReportRow], output_dir: &Path) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        info!(target: "report", "no rows to write");
        return Ok(None);
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;
    let path = output_dir.join(default_file_name(Local::now()));
    write_report_to(rows, &path)?;
    Ok(Some(path))
}

/// Write rows to an exact path (tmp file + rename).
pub fn write_report_to(rows: &[ReportRow], path: &Path) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut file =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        for row in rows {
            writer.serialize(CsvRecord::from(row))?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("moving report to {}", path.display()))?;
    info!(target: "report", path = %path.display(), rows = rows.len(), "report written");
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub total: usize,
    pub succeeded: usize,
    pub risky: usize,
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl SourceStats {
    pub fn success_rate(&self) -> f64 {
        ratio(self.succeeded, self.total)
    }

    pub fn risk_rate(&self) -> f64 {
        ratio(self.risky, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportStats {
    pub per_source: BTreeMap<Platform, SourceStats>,
    pub total: usize,
    pub risky: usize,
}

impl ReportStats {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            let s = stats.per_source.entry(row.source).or_default();
            s.total += 1;
            if row.fetch_succeeded {
                s.succeeded += 1;
            }
            if row.verdict.is_risky() {
                s.risky += 1;
                stats.risky += 1;
            }
            stats.total += 1;
        }
        stats
    }

    pub fn overall_risk_rate(&self) -> f64 {
        ratio(self.risky, self.total)
    }

    /// Console summary shown after the report is written.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Posts analyzed: {}\n", self.total));
        out.push_str("\n=== Per-source results ===\n");
        for (platform, s) in &self.per_source {
            out.push_str(&format!(
                "{}: {} collected, success rate {:.1}%, risk rate {:.1}%\n",
                platform,
                s.total,
                s.success_rate() * 100.0,
                s.risk_rate() * 100.0
            ));
        }
        out.push_str(&format!("\nPosts judged risky: {}\n", self.risky));
        out.push_str(&format!(
            "Overall risk rate: {:.1}%\n",
            self.overall_risk_rate() * 100.0
        ));
        out
    }
}

/// Print where the report went and the aggregate statistics.
pub fn print_summary(rows: &[ReportRow], path: &Path) {
    let stats = ReportStats::from_rows(rows);
    println!("\nReport saved to '{}'", path.display());
    print!("{}", stats.render());
    info!(
        target: "report",
        total = stats.total,
        risky = stats.risky,
        "summary printed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_has_timestamp() {
        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            default_file_name(now),
            "suicide_monitoring_result_20250102_030405.csv"
        );
    }

    #[test]
    fn shorten_adds_ellipsis_only_when_needed() {
        assert_eq!(shorten("abc", 5), "abc");
        assert_eq!(shorten("abcdef", 5), "abcde...");
    }

    #[test]
    fn ratios_handle_zero() {
        let s = SourceStats::default();
        assert_eq!(s.success_rate(), 0.0);
        assert_eq!(ReportStats::default().overall_risk_rate(), 0.0);
    }
}
