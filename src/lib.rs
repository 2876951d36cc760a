// src/lib.rs
// Library surface for the binary and the integration tests.

pub mod analyze;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod ingest;
pub mod report;
pub mod settings;

pub use error::{Error, Result};

use std::path::PathBuf;
use tracing::info;

use crate::analyze::{analyze_all, KeywordScorer, RiskScorer};
use crate::config::Config;
use crate::ingest::providers::build_adapter;
use crate::ingest::{collect_all, SourcePlan};
use crate::report::{write_report, ReportRow};
use crate::settings::RunSettings;

/// What one run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub collected: usize,
    pub rows: Vec<ReportRow>,
    pub report: Option<PathBuf>,
}

/// One adapter per selected platform, in selection order.
pub fn build_plans(cfg: &Config, settings: &RunSettings) -> Vec<SourcePlan> {
    settings
        .platforms
        .iter()
        .map(|&p| SourcePlan::new(build_adapter(p, cfg), settings.count_for(p)))
        .collect()
}

/// Collect, score and write the report. Stops after collection when
/// nothing was found.
pub async fn run_pipeline(
    cfg: &Config,
    settings: &RunSettings,
    primary: &dyn RiskScorer,
) -> anyhow::Result<RunOutcome> {
    let plans = build_plans(cfg, settings);
    let records = collect_all(&settings.keywords, &plans, Some(settings.range)).await;
    // Adapters (and their HTTP pools) are no longer needed.
    drop(plans);

    if records.is_empty() {
        info!(target: "pipeline", "nothing collected; skipping analysis");
        return Ok(RunOutcome::default());
    }

    let fallback = KeywordScorer::new(cfg.risk_threshold);
    let rows = analyze_all(&records, primary, &fallback).await;
    let report = write_report(&rows, &settings.output_dir)?;

    Ok(RunOutcome {
        collected: records.len(),
        rows,
        report,
    })
}
