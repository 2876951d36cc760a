// src/config/mod.rs
//! Run configuration: built-in defaults, optional TOML file, then env.
//!
//! Built once in `main` and passed by reference; nothing reads the
//! environment after that.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::types::Platform;
pub use ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";
pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.3;
/// Upper bound on the per-request delay, in seconds.
pub const MAX_REQUEST_DELAY_SECS: f64 = 300.0;

/// Default per-platform target counts.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MaxResults {
    pub twitter: usize,
    pub naver: usize,
    pub dcinside: usize,
}

impl Default for MaxResults {
    fn default() -> Self {
        Self {
            twitter: 100,
            naver: 50,
            dcinside: 30,
        }
    }
}

impl MaxResults {
    pub fn for_platform(&self, platform: Platform) -> usize {
        match platform {
            Platform::Twitter => self.twitter,
            Platform::NaverBlog => self.naver,
            Platform::DcInside => self.dcinside,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub twitter_bearer_token: Option<String>,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub ai: AiConfig,
    pub max_results: MaxResults,
    pub request_delay_secs: f64,
    pub timeout_secs: u64,
    pub content_max_length: usize,
    pub risk_threshold: f64,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            twitter_bearer_token: None,
            naver_client_id: None,
            naver_client_secret: None,
            ai: AiConfig::default(),
            max_results: MaxResults::default(),
            request_delay_secs: 1.5,
            timeout_secs: 10,
            content_max_length: 1000,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl Config {
    /// Load config using:
    /// 1) explicit `path` (must exist)
    /// 2) $MONITOR_CONFIG_PATH (must exist)
    /// 3) config/monitor.toml if present
    /// 4) defaults
    ///
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(ENV_CONFIG_PATH) {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => {
                    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                    default.exists().then_some(default)
                }
            },
        };

        let mut cfg = match file {
            Some(p) => {
                if !p.exists() {
                    return Err(anyhow!("config file {} does not exist", p.display()));
                }
                Self::from_file(&p)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Apply overrides from a key lookup (normally `std::env::var`).
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = lookup("TWITTER_BEARER_TOKEN") {
            self.twitter_bearer_token = Some(v);
        }
        if let Some(v) = lookup("NAVER_CLIENT_ID") {
            self.naver_client_id = Some(v);
        }
        if let Some(v) = lookup("NAVER_CLIENT_SECRET") {
            self.naver_client_secret = Some(v);
        }
        if let Some(v) = lookup("MONITOR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("RISK_THRESHOLD").and_then(|s| s.parse::<f64>().ok()) {
            self.risk_threshold = v;
        }
        self.ai.apply_env(&lookup);
        self.sanitize();
    }

    fn sanitize(&mut self) {
        self.risk_threshold = if self.risk_threshold.is_nan() {
            DEFAULT_RISK_THRESHOLD
        } else {
            self.risk_threshold.clamp(0.0, 1.0)
        };
        if self.request_delay_secs.is_nan() || self.request_delay_secs < 0.0 {
            self.request_delay_secs = 0.0;
        }
        self.request_delay_secs = self.request_delay_secs.min(MAX_REQUEST_DELAY_SECS);
        if self.timeout_secs == 0 {
            self.timeout_secs = Config::default().timeout_secs;
        }
        if self.content_max_length == 0 {
            self.content_max_length = Config::default().content_max_length;
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_secs).unwrap_or(Duration::ZERO)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_twitter(&self) -> bool {
        self.twitter_bearer_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    pub fn has_naver(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.naver_client_id) && present(&self.naver_client_secret)
    }

    pub fn has_openai(&self) -> bool {
        self.ai.has_valid_key()
    }

    pub fn masked_openai_key(&self) -> Option<String> {
        self.ai.masked_key()
    }

    /// Whether a platform has what it needs to be queried. Scraping needs no key.
    pub fn platform_available(&self, platform: Platform) -> bool {
        match platform {
            Platform::Twitter => self.has_twitter(),
            Platform::NaverBlog => self.has_naver(),
            Platform::DcInside => true,
        }
    }

    pub fn available_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.platform_available(*p))
            .collect()
    }

    /// Human-readable warnings for missing or malformed credentials.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.has_twitter() {
            warnings.push("TWITTER_BEARER_TOKEN missing; Twitter collection disabled".to_string());
        }
        if !self.has_naver() {
            warnings.push(
                "NAVER_CLIENT_ID / NAVER_CLIENT_SECRET missing; Naver blog collection disabled"
                    .to_string(),
            );
        }
        if !self.ai.key_present() {
            warnings.push("OPENAI_API_KEY missing; keyword scoring only".to_string());
        } else if !self.ai.has_valid_key() {
            warnings.push(format!(
                "OPENAI_API_KEY malformed (expected prefix `{}`); keyword scoring only",
                ai::OPENAI_KEY_PREFIX
            ));
        }
        warnings
    }
}
