//! risk-monitor: collect posts by keyword, score them, write a CSV report.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use suicide_risk_monitor::analyze::{ModelScorer, RiskScorer};
use suicide_risk_monitor::cli::{self, Args, Prompter};
use suicide_risk_monitor::config::Config;
use suicide_risk_monitor::report::print_summary;
use suicide_risk_monitor::run_pipeline;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    for warning in cfg.validate() {
        warn!(target: "config", "{warning}");
    }
    if let Some(key) = cfg.masked_openai_key() {
        info!(target: "config", %key, "openai key loaded");
    }

    println!("==================================================");
    println!("Suicide-risk post monitor");
    println!("==================================================");

    let settings = {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        match cli::gather_settings(&args, &cfg, &mut prompter)? {
            Some(s) => s,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    println!("\nKeywords: {}", settings.keywords.join(", "));
    println!("Period: {} ~ {}", settings.range.start(), settings.range.end());
    for p in &settings.platforms {
        println!("  {p}: {} posts", settings.count_for(*p));
    }

    let scorer = ModelScorer::from_config(&cfg.ai, cfg.timeout());
    let scorer = if args.skip_probe {
        scorer
    } else {
        scorer.probe().await
    };
    if scorer.is_available() {
        println!("Scoring: model (keyword fallback)");
    } else {
        println!("Scoring: keyword only");
    }

    tokio::select! {
        outcome = run_pipeline(&cfg, &settings, &scorer) => {
            let outcome = outcome?;
            if outcome.collected == 0 {
                println!("\nNo posts were collected. Check the keywords and API credentials.");
                return Ok(());
            }
            match outcome.report {
                Some(path) => print_summary(&outcome.rows, &path),
                None => println!("\nNo post had text to analyze; no report written."),
            }
            info!(target: "pipeline", collected = outcome.collected, scored = outcome.rows.len(), "run finished");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!(target: "pipeline", "interrupted");
            println!("\nInterrupted by user.");
        }
    }

    Ok(())
}
