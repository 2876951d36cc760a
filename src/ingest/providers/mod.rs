// src/ingest/providers/mod.rs
pub mod dcinside;
pub mod naver_blog;
pub mod twitter;

use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::config::Config;
use crate::ingest::types::{Platform, SourceAdapter};

pub use dcinside::DcInsideProvider;
pub use naver_blog::NaverBlogProvider;
pub use twitter::TwitterProvider;

pub(crate) const USER_AGENT: &str = "suicide-risk-monitor/0.1";

/// Shared HTTP client setup. Falls back to a default client if the builder
/// rejects the settings (e.g. a broken TLS backend), so a source never
/// fails at construction time.
pub(crate) fn http_client(timeout: Duration, user_agent: &str, headers: HeaderMap) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .connect_timeout(timeout.min(Duration::from_secs(4)).max(Duration::from_secs(1)))
        .timeout(timeout)
        .gzip(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "http client builder failed; using defaults");
            reqwest::Client::new()
        })
}

/// Build the adapter for a platform from the run config.
pub fn build_adapter(platform: Platform, cfg: &Config) -> Box<dyn SourceAdapter> {
    match platform {
        Platform::Twitter => Box::new(TwitterProvider::from_config(cfg)),
        Platform::NaverBlog => Box::new(NaverBlogProvider::from_config(cfg)),
        Platform::DcInside => Box::new(DcInsideProvider::from_config(cfg)),
    }
}
