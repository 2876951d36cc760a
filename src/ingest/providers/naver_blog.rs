// src/ingest/providers/naver_blog.rs
//! Naver blog search API (client id/secret headers, offset pagination).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::providers::{http_client, USER_AGENT};
use crate::ingest::types::{DateRange, Platform, PostRecord, SourceAdapter};

pub const NAVER_API_BASE: &str = "https://openapi.naver.com";

/// Upstream limit on `display`.
pub const MAX_PAGE_SIZE: usize = 100;
/// Upstream limit on `start` (1-based offset).
pub const MAX_OFFSET: usize = 1000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    bloggername: Option<String>,
    #[serde(default)]
    postdate: Option<String>,
}

/// `postdate` is `YYYYMMDD`; midnight UTC.
fn parse_postdate(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// How many results the offset/page-size caps let us reach for a request.
pub fn reachable_count(target_count: usize) -> usize {
    target_count.min(MAX_OFFSET)
}

pub struct NaverBlogProvider {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
    max_body_chars: usize,
}

impl NaverBlogProvider {
    pub fn from_config(cfg: &Config) -> Self {
        let credentials = if cfg.has_naver() {
            cfg.naver_client_id
                .clone()
                .zip(cfg.naver_client_secret.clone())
        } else {
            None
        };
        Self {
            client: http_client(cfg.timeout(), USER_AGENT, HeaderMap::new()),
            base_url: NAVER_API_BASE.to_string(),
            credentials,
            max_body_chars: cfg.content_max_length,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_page(
        &self,
        (id, secret): (&str, &str),
        keyword: &str,
        start: usize,
        display: usize,
    ) -> Result<SearchResponse> {
        let resp = self
            .client
            .get(format!("{}/v1/search/blog.json", self.base_url))
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .query(&[
                ("query", keyword.to_string()),
                ("display", display.to_string()),
                ("start", start.to_string()),
                ("sort", "date".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "naver blog search"));
        }
        Ok(resp.json::<SearchResponse>().await?)
    }
}

#[async_trait]
impl SourceAdapter for NaverBlogProvider {
    async fn collect(
        &self,
        keyword: &str,
        target_count: usize,
        _range: Option<DateRange>,
    ) -> Result<Vec<PostRecord>> {
        let (id, secret) = self
            .credentials
            .as_ref()
            .map(|(i, s)| (i.as_str(), s.as_str()))
            .ok_or_else(|| {
                Error::Configuration("NAVER_CLIENT_ID / NAVER_CLIENT_SECRET are not set".into())
            })?;

        let mut out = Vec::new();
        if target_count == 0 {
            return Ok(out);
        }

        let reachable = reachable_count(target_count);
        if reachable < target_count {
            warn!(
                provider = "naver",
                requested = target_count,
                reachable,
                "requested count exceeds what the API can page through"
            );
        }

        let mut start = 1usize;
        while out.len() < target_count && start <= MAX_OFFSET {
            let page_size = (target_count - out.len()).min(MAX_PAGE_SIZE);
            let page = match self.fetch_page((id, secret), keyword, start, page_size).await {
                Ok(p) => p,
                Err(e) if out.is_empty() => return Err(e),
                Err(e) => {
                    warn!(provider = "naver", error = %e, start, "page failed; stopping");
                    counter!("collect_errors_total").increment(1);
                    break;
                }
            };

            if start == 1 && (page.total as usize) < target_count {
                info!(
                    provider = "naver",
                    requested = target_count,
                    total = page.total,
                    "fewer results available than requested"
                );
            }

            let got = page.items.len();
            debug!(provider = "naver", start, page_size, got, "page received");
            for item in page.items {
                if out.len() >= target_count {
                    break;
                }
                let created_at = item.postdate.as_deref().and_then(parse_postdate);
                out.push(
                    PostRecord::from_raw(
                        Platform::NaverBlog,
                        item.link,
                        &item.title,
                        &item.description,
                        keyword,
                        created_at,
                        self.max_body_chars,
                    )
                    .with_author(item.bloggername),
                );
            }

            if got < page_size {
                break;
            }
            start += got;
        }

        info!(provider = "naver", %keyword, collected = out.len(), "naver blog search done");
        Ok(out)
    }

    fn platform(&self) -> Platform {
        Platform::NaverBlog
    }
}
