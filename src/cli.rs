// src/cli.rs
//! Command-line flags and the interactive prompt loop.
//!
//! Flags pre-fill answers; anything missing is asked on stdin. Every answer
//! goes through the parsers in `settings`, and the assembled input is run
//! through `settings::validate` once more at the end.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;
use crate::ingest::types::{DateRange, Platform};
use crate::settings::{self, CountDecision, RawInput, RunSettings, ValidationError};

#[derive(Debug, Parser)]
#[command(
    name = "risk-monitor",
    version,
    about = "Collect posts by keyword, score them for suicide-risk content, write a CSV report"
)]
pub struct Args {
    /// `all`, `available`, or comma-separated menu numbers (1=Twitter, 2=Naver Blog, 3=DCInside)
    #[arg(long)]
    pub platforms: Option<String>,

    /// Comma-separated search keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Start date, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,

    /// End date, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub twitter_count: Option<String>,

    #[arg(long)]
    pub naver_count: Option<String>,

    #[arg(long)]
    pub dcinside_count: Option<String>,

    /// Report directory (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// TOML config file (overrides $MONITOR_CONFIG_PATH)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Do not test the model endpoint before the run
    #[arg(long)]
    pub skip_probe: bool,
}

impl Args {
    fn preset_count(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Twitter => self.twitter_count.as_deref(),
            Platform::NaverBlog => self.naver_count.as_deref(),
            Platform::DcInside => self.dcinside_count.as_deref(),
        }
    }

    /// True when every question before the counts was answered by a flag,
    /// or `--yes` was given. Missing counts then take the configured default.
    fn non_interactive(&self) -> bool {
        self.yes
            || (self.platforms.is_some()
                && self.keywords.is_some()
                && self.start.is_some()
                && self.end.is_some())
    }
}

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("reading answer")?;
        if n == 0 {
            bail!("input closed while waiting for an answer");
        }
        Ok(line.trim().to_string())
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} (y/n): "))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }

    /// Parse a flag value once, or keep asking until the answer parses.
    /// Returns the accepted raw text alongside the parsed value.
    fn resolve<T>(
        &mut self,
        preset: Option<&str>,
        question: &str,
        parse: impl Fn(&str) -> std::result::Result<T, ValidationError>,
    ) -> Result<(String, T)> {
        if let Some(raw) = preset {
            let value = parse(raw)?;
            return Ok((raw.to_string(), value));
        }
        loop {
            let raw = self.ask(question)?;
            match parse(&raw) {
                Ok(value) => return Ok((raw, value)),
                Err(e) => self.say(&format!("  {e}"))?,
            }
        }
    }
}

fn print_menu<R: BufRead, W: Write>(p: &mut Prompter<R, W>, cfg: &Config) -> Result<()> {
    p.say("\n=== Platforms ===")?;
    for (i, platform) in Platform::ALL.iter().enumerate() {
        let status = if cfg.platform_available(*platform) {
            "available"
        } else {
            "missing credentials"
        };
        p.say(&format!(
            "{}. {} - {} ({status})",
            i + 1,
            platform,
            platform.description()
        ))?;
    }
    p.say("Enter numbers separated by commas, 'all'/'a', or 'available'/'av'.")
}

/// Gather run settings from flags and prompts.
/// `Ok(None)` means the user declined to continue.
pub fn gather_settings<R: BufRead, W: Write>(
    args: &Args,
    cfg: &Config,
    p: &mut Prompter<R, W>,
) -> Result<Option<RunSettings>> {
    let available = cfg.available_platforms();

    if args.platforms.is_none() {
        print_menu(p, cfg)?;
    }
    let (platforms_raw, selected) = p.resolve(
        args.platforms.as_deref(),
        "Platforms to collect from: ",
        |s| settings::parse_platform_selection(s, &available),
    )?;

    let (usable, dropped) = settings::split_available(&selected, &available);
    for platform in &dropped {
        warn!(target: "cli", %platform, "selected platform has no credentials; skipped");
        p.say(&format!("x {platform} (missing credentials, skipped)"))?;
    }
    if usable.is_empty() {
        p.say("None of the selected platforms can be used. Check the API credentials.")?;
        return Ok(None);
    }
    if !dropped.is_empty()
        && !args.yes
        && !p.confirm(&format!(
            "Continue without {} unavailable platform(s)?",
            dropped.len()
        ))?
    {
        return Ok(None);
    }

    let (keywords_raw, _) = p.resolve(
        args.keywords.as_deref(),
        "Keywords (comma-separated): ",
        settings::parse_keywords,
    )?;

    let (start_raw, end_raw) = loop {
        let (start_raw, start) =
            p.resolve(args.start.as_deref(), "Start date (YYYY-MM-DD): ", settings::parse_date)?;
        let (end_raw, end) =
            p.resolve(args.end.as_deref(), "End date (YYYY-MM-DD): ", settings::parse_date)?;
        if DateRange::new(start, end).is_some() {
            break (start_raw, end_raw);
        }
        let err = ValidationError::InvertedRange { start, end };
        if args.start.is_some() && args.end.is_some() {
            return Err(err.into());
        }
        p.say(&format!("  {err}"))?;
    };

    let mut counts = BTreeMap::new();
    for &platform in &usable {
        let default = cfg.max_results.for_platform(platform);
        let question = format!("Posts to collect from {platform} (default {default}, Enter for default): ");
        let preset = args
            .preset_count(platform)
            .or_else(|| args.non_interactive().then_some(""));
        let raw = loop {
            let (raw, decision) =
                p.resolve(preset, &question, |s| settings::parse_count(s, platform, default))?;
            match decision {
                CountDecision::Accept(_) => break raw,
                CountDecision::NeedsConfirmation(n) => {
                    if args.yes || p.confirm(&format!("{n} posts is a large amount. Continue?"))? {
                        break raw;
                    }
                    if preset.is_some() {
                        return Err(ValidationError::UnconfirmedCount { platform, count: n }.into());
                    }
                }
            }
        };
        counts.insert(platform, raw);
    }

    let raw = RawInput {
        platforms: platforms_raw,
        keywords: keywords_raw,
        start: start_raw,
        end: end_raw,
        counts,
        output_dir: args.output_dir.clone(),
        assume_yes: true,
    };
    match settings::validate(&raw, cfg) {
        Ok(run) => Ok(Some(run)),
        Err(errors) => {
            let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("invalid settings: {}", joined.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Cursor;

    fn run(args: &[&str], answers: &str) -> Result<Option<RunSettings>> {
        let args = Args::try_parse_from(std::iter::once("risk-monitor").chain(args.iter().copied()))
            .expect("args parse");
        let mut out = Vec::new();
        let mut p = Prompter::new(Cursor::new(answers.as_bytes().to_vec()), &mut out);
        gather_settings(&args, &Config::default(), &mut p)
    }

    #[test]
    fn clap_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_only() {
        let s = run(
            &[
                "--platforms", "3", "--keywords", "우울, 자살",
                "--start", "2024-05-01", "--end", "2024-05-02",
            ],
            "",
        )
        .unwrap()
        .unwrap();
        assert_eq!(s.platforms, vec![Platform::DcInside]);
        assert_eq!(s.keywords, vec!["우울", "자살"]);
        assert_eq!(s.count_for(Platform::DcInside), 30);
    }

    #[test]
    fn yes_fills_missing_counts_with_defaults() {
        let s = run(
            &[
                "--platforms", "available", "--keywords", "k",
                "--start", "2024-05-01", "--end", "2024-05-01", "--yes",
            ],
            "",
        )
        .unwrap()
        .unwrap();
        assert_eq!(s.platforms, vec![Platform::DcInside]);
        assert_eq!(s.count_for(Platform::DcInside), 30);
    }

    #[test]
    fn prompts_reask_until_valid() {
        let answers = "9\n3\n\n힘들\n2024-13-01\n2024-05-01\n2024-05-03\nabc\n5\n";
        let s = run(&[], answers).unwrap().unwrap();
        assert_eq!(s.platforms, vec![Platform::DcInside]);
        assert_eq!(s.keywords, vec!["힘들"]);
        assert_eq!(s.count_for(Platform::DcInside), 5);
    }

    #[test]
    fn unavailable_platforms_need_confirmation() {
        // Twitter and Naver have no credentials in the default config.
        let declined = run(&["--platforms", "all"], "n\n").unwrap();
        assert!(declined.is_none());

        let only_unavailable = run(&["--platforms", "1,2"], "").unwrap();
        assert!(only_unavailable.is_none());
    }

    #[test]
    fn large_count_flag_with_yes() {
        let s = run(
            &[
                "--platforms", "3", "--keywords", "k", "--start", "2024-05-01",
                "--end", "2024-05-01", "--dcinside-count", "1500", "--yes",
            ],
            "",
        )
        .unwrap()
        .unwrap();
        assert_eq!(s.count_for(Platform::DcInside), 1500);
    }

    #[test]
    fn invalid_flag_is_an_error() {
        assert!(run(&["--platforms", "7"], "").is_err());
    }
}
