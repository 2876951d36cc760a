// src/settings.rs
//! Turns raw answers (flags or prompt input) into a validated run plan.
//! Nothing here touches stdin or the network.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::ingest::types::{DateRange, Platform};

/// Counts above this need an explicit confirmation.
pub const LARGE_COUNT: usize = 1000;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no platform selected")]
    NoPlatform,
    #[error("invalid platform number: {0}")]
    InvalidPlatform(String),
    #[error("none of the selected platforms is usable; check the API credentials")]
    NoUsablePlatform,
    #[error("no keywords given")]
    NoKeywords,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("{platform}: '{value}' is not a number")]
    NotANumber { platform: Platform, value: String },
    #[error("{platform}: count must be at least 1")]
    NonPositiveCount { platform: Platform },
    #[error("{platform}: {count} posts is a large amount and was not confirmed")]
    UnconfirmedCount { platform: Platform, count: usize },
}

/// Outcome of a well-formed count answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDecision {
    Accept(usize),
    NeedsConfirmation(usize),
}

/// `all`/`a`, `available`/`av`, or comma-separated 1-based menu indices.
/// Duplicate indices are kept once, in first-seen order.
pub fn parse_platform_selection(
    raw: &str,
    available: &[Platform],
) -> Result<Vec<Platform>, ValidationError> {
    let answer = raw.trim().to_lowercase();
    let selected: Vec<Platform> = match answer.as_str() {
        "all" | "a" => Platform::ALL.to_vec(),
        "available" | "av" => Platform::ALL
            .into_iter()
            .filter(|p| available.contains(p))
            .collect(),
        _ => {
            let mut out = Vec::new();
            for part in answer.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let platform = part
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| Platform::ALL.get(i).copied())
                    .ok_or_else(|| ValidationError::InvalidPlatform(part.to_string()))?;
                if !out.contains(&platform) {
                    out.push(platform);
                }
            }
            out
        }
    };

    if selected.is_empty() {
        return Err(ValidationError::NoPlatform);
    }
    Ok(selected)
}

/// Split a selection into (usable, unavailable), order preserved.
pub fn split_available(selected: &[Platform], available: &[Platform]) -> (Vec<Platform>, Vec<Platform>) {
    selected.iter().copied().partition(|p| available.contains(p))
}

/// Comma-separated; blanks dropped.
pub fn parse_keywords(raw: &str) -> Result<Vec<String>, ValidationError> {
    let keywords: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();
    if keywords.is_empty() {
        return Err(ValidationError::NoKeywords);
    }
    Ok(keywords)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

pub fn parse_date_range(start: &str, end: &str) -> Result<DateRange, ValidationError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    DateRange::new(start, end).ok_or(ValidationError::InvertedRange { start, end })
}

/// Empty input takes `default`; values above [`LARGE_COUNT`] need confirming.
pub fn parse_count(
    raw: &str,
    platform: Platform,
    default: usize,
) -> Result<CountDecision, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CountDecision::Accept(default));
    }
    let n: i64 = trimmed.parse().map_err(|_| ValidationError::NotANumber {
        platform,
        value: trimmed.to_string(),
    })?;
    if n <= 0 {
        return Err(ValidationError::NonPositiveCount { platform });
    }
    let n = n as usize;
    if n > LARGE_COUNT {
        Ok(CountDecision::NeedsConfirmation(n))
    } else {
        Ok(CountDecision::Accept(n))
    }
}

/// Raw answers before validation. A missing or blank count takes the default.
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    pub platforms: String,
    pub keywords: String,
    pub start: String,
    pub end: String,
    pub counts: BTreeMap<Platform, String>,
    pub output_dir: Option<PathBuf>,
    /// Accept large counts and drop unavailable platforms without asking.
    pub assume_yes: bool,
}

/// A validated plan for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub platforms: Vec<Platform>,
    /// Selected but lacking credentials.
    pub dropped: Vec<Platform>,
    pub keywords: Vec<String>,
    pub range: DateRange,
    pub counts: BTreeMap<Platform, usize>,
    pub output_dir: PathBuf,
}

impl RunSettings {
    pub fn count_for(&self, platform: Platform) -> usize {
        self.counts.get(&platform).copied().unwrap_or_default()
    }
}

/// Validate every field and report all problems at once.
pub fn validate(raw: &RawInput, cfg: &Config) -> Result<RunSettings, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let available = cfg.available_platforms();

    let (platforms, dropped) = match parse_platform_selection(&raw.platforms, &available) {
        Ok(selected) => {
            let (usable, dropped) = split_available(&selected, &available);
            if usable.is_empty() {
                errors.push(ValidationError::NoUsablePlatform);
            }
            (usable, dropped)
        }
        Err(e) => {
            errors.push(e);
            (Vec::new(), Vec::new())
        }
    };

    let keywords = parse_keywords(&raw.keywords).unwrap_or_else(|e| {
        errors.push(e);
        Vec::new()
    });

    let range = match parse_date_range(&raw.start, &raw.end) {
        Ok(r) => Some(r),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let mut counts = BTreeMap::new();
    for &platform in &platforms {
        let answer = raw.counts.get(&platform).map(String::as_str).unwrap_or("");
        match parse_count(answer, platform, cfg.max_results.for_platform(platform)) {
            Ok(CountDecision::Accept(n)) => {
                counts.insert(platform, n);
            }
            Ok(CountDecision::NeedsConfirmation(n)) if raw.assume_yes => {
                counts.insert(platform, n);
            }
            Ok(CountDecision::NeedsConfirmation(count)) => {
                errors.push(ValidationError::UnconfirmedCount { platform, count });
            }
            Err(e) => errors.push(e),
        }
    }

    match range {
        Some(range) if errors.is_empty() => Ok(RunSettings {
            platforms,
            dropped,
            keywords,
            range,
            counts,
            output_dir: raw
                .output_dir
                .clone()
                .unwrap_or_else(|| cfg.output_dir.clone()),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_keywords() {
        let avail = [Platform::DcInside];
        assert_eq!(
            parse_platform_selection("ALL", &avail).unwrap(),
            Platform::ALL.to_vec()
        );
        assert_eq!(
            parse_platform_selection("av", &avail).unwrap(),
            vec![Platform::DcInside]
        );
        assert_eq!(
            parse_platform_selection("available", &[]),
            Err(ValidationError::NoPlatform)
        );
    }

    #[test]
    fn selection_indices() {
        assert_eq!(
            parse_platform_selection("3, 1,3", &[]).unwrap(),
            vec![Platform::DcInside, Platform::Twitter]
        );
        assert_eq!(
            parse_platform_selection("1,4", &[]),
            Err(ValidationError::InvalidPlatform("4".into()))
        );
        assert_eq!(
            parse_platform_selection("0", &[]),
            Err(ValidationError::InvalidPlatform("0".into()))
        );
        assert_eq!(parse_platform_selection(" ", &[]), Err(ValidationError::NoPlatform));
    }

    #[test]
    fn counts() {
        let p = Platform::NaverBlog;
        assert_eq!(parse_count("", p, 50), Ok(CountDecision::Accept(50)));
        assert_eq!(parse_count("1000", p, 50), Ok(CountDecision::Accept(1000)));
        assert_eq!(
            parse_count("1001", p, 50),
            Ok(CountDecision::NeedsConfirmation(1001))
        );
        assert_eq!(
            parse_count("0", p, 50),
            Err(ValidationError::NonPositiveCount { platform: p })
        );
        assert!(matches!(
            parse_count("ten", p, 50),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn date_range_order() {
        assert!(parse_date_range("2024-05-01", "2024-05-01").is_ok());
        assert!(matches!(
            parse_date_range("2024-05-02", "2024-05-01"),
            Err(ValidationError::InvertedRange { .. })
        ));
        assert_eq!(
            parse_date_range("2024/05/01", "2024-05-02"),
            Err(ValidationError::InvalidDate("2024/05/01".into()))
        );
    }

    #[test]
    fn keywords_drop_blanks() {
        assert_eq!(parse_keywords(" 자살 , ,우울 ").unwrap(), vec!["자살", "우울"]);
        assert_eq!(parse_keywords(" , "), Err(ValidationError::NoKeywords));
    }
}
