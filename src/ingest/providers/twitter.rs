// src/ingest/providers/twitter.rs
//! Twitter/X recent search (API v2, bearer token).

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::counter;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::providers::{http_client, USER_AGENT};
use crate::ingest::types::{DateRange, Platform, PostRecord, SourceAdapter};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com";

/// The API rejects an `end_time` closer than ~10s to now; stay well clear.
const END_TIME_SAFETY_SECS: i64 = 60;
const MIN_PAGE: usize = 10;
const MAX_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
}

/// Compute `(start_time, end_time)` for a search issued at `now`.
///
/// The upper bound is the end of the user's last day (23:59:00) but never
/// later than `now - 60s`; the lower bound is the start of the first day.
pub fn search_window(
    range: Option<DateRange>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
    let safe_end = now - ChronoDuration::seconds(END_TIME_SAFETY_SECS);
    match range {
        Some(r) => {
            let user_end = r
                .end()
                .and_hms_opt(23, 59, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or(safe_end);
            let start = r.start().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            (start, user_end.min(safe_end))
        }
        None => (None, safe_end),
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub struct TwitterProvider {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    max_body_chars: usize,
}

impl TwitterProvider {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            client: http_client(cfg.timeout(), USER_AGENT, HeaderMap::new()),
            base_url: TWITTER_API_BASE.to_string(),
            bearer_token: cfg.twitter_bearer_token.clone().filter(|t| !t.is_empty()),
            max_body_chars: cfg.content_max_length,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_page(
        &self,
        token: &str,
        keyword: &str,
        page_size: usize,
        window: (Option<DateTime<Utc>>, DateTime<Utc>),
        next_token: Option<&str>,
    ) -> Result<SearchResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", format!("{keyword} -is:retweet lang:ko")),
            ("max_results", page_size.to_string()),
            ("tweet.fields", "created_at,author_id".to_string()),
            ("end_time", format_ts(window.1)),
        ];
        if let Some(start) = window.0 {
            query.push(("start_time", format_ts(start)));
        }
        if let Some(t) = next_token {
            query.push(("next_token", t.to_string()));
        }

        let resp = self
            .client
            .get(format!("{}/2/tweets/search/recent", self.base_url))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "twitter search"));
        }
        Ok(resp.json::<SearchResponse>().await?)
    }
}

#[async_trait]
impl SourceAdapter for TwitterProvider {
    async fn collect(
        &self,
        keyword: &str,
        target_count: usize,
        range: Option<DateRange>,
    ) -> Result<Vec<PostRecord>> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| Error::Configuration("TWITTER_BEARER_TOKEN is not set".into()))?;

        let mut out = Vec::new();
        if target_count == 0 {
            return Ok(out);
        }

        let window = search_window(range, Utc::now());
        if let Some(start) = window.0 {
            if start >= window.1 {
                warn!(
                    provider = "twitter",
                    start = %format_ts(start),
                    end = %format_ts(window.1),
                    "date range ends before it starts once clamped to now; skipping"
                );
                return Ok(out);
            }
        }

        let mut next_token: Option<String> = None;
        while out.len() < target_count {
            let page_size = (target_count - out.len()).clamp(MIN_PAGE, MAX_PAGE);
            let page = match self
                .fetch_page(token, keyword, page_size, window, next_token.as_deref())
                .await
            {
                Ok(p) => p,
                Err(e) if out.is_empty() => return Err(e),
                Err(e) => {
                    warn!(provider = "twitter", error = %e, collected = out.len(), "page failed; stopping");
                    counter!("collect_errors_total").increment(1);
                    break;
                }
            };

            let got = page.data.len();
            debug!(provider = "twitter", got, page_size, "page received");
            for tweet in page.data {
                if out.len() >= target_count {
                    break;
                }
                out.push(PostRecord::from_raw(
                    Platform::Twitter,
                    format!("https://twitter.com/user/status/{}", tweet.id),
                    "",
                    &tweet.text,
                    keyword,
                    tweet.created_at,
                    self.max_body_chars,
                ));
            }

            match page.meta.next_token {
                Some(t) if got >= page_size => next_token = Some(t),
                _ => break,
            }
        }

        info!(provider = "twitter", %keyword, collected = out.len(), "twitter search done");
        Ok(out)
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }
}
