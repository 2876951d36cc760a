// src/ingest/providers/dcinside.rs
//! DCInside forum scraping: one search results page, then each post page.

use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::providers::http_client;
use crate::ingest::types::{DateRange, Platform, PostRecord, SourceAdapter};

pub const SEARCH_BASE: &str = "https://search.dcinside.com";
pub const GALLERY_BASE: &str = "https://gall.dcinside.com";

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const PRIMARY_LINK_SELECTOR: &str = "a.tit";
const FALLBACK_LINK_SELECTORS: [&str; 5] = [
    r#"a[href*="/board/view/"]"#,
    ".gall_tit a",
    ".title a",
    "a.title",
    ".ub-word a",
];
const CONTENT_SELECTORS: [&str; 8] = [
    "div.writing_view_box",
    ".write_div",
    ".view_content_wrap",
    ".gallery_re_cont",
    ".dccon_wrapper",
    ".writing_view_box .inner",
    ".view_content",
    ".usertxt",
];
/// Extracted text must be longer than this (chars) to count as content.
const MIN_CONTENT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLink {
    pub url: String,
    pub title: String,
}

fn resolve_href(href: &str, gallery_base: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with('/') {
        Some(format!("{}{}", gallery_base.trim_end_matches('/'), href))
    } else if href.starts_with("http") {
        Some(href.to_string())
    } else {
        None
    }
}

/// Candidate post links from a search results page. Tries `a.tit` first,
/// then each fallback selector in order until one yields anything.
pub fn extract_links(html: &str, gallery_base: &str) -> Vec<PostLink> {
    let doc = Html::parse_document(html);

    let mut selectors = std::iter::once(PRIMARY_LINK_SELECTOR).chain(FALLBACK_LINK_SELECTORS);
    let matched = selectors.find_map(|raw| {
        let sel = Selector::parse(raw).ok()?;
        let found: Vec<_> = doc.select(&sel).collect();
        if found.is_empty() {
            None
        } else {
            if raw != PRIMARY_LINK_SELECTOR {
                debug!(provider = "dcinside", selector = raw, count = found.len(), "fallback selector matched");
            }
            Some(found)
        }
    });

    matched
        .unwrap_or_default()
        .into_iter()
        .filter_map(|el| {
            let url = resolve_href(el.value().attr("href")?, gallery_base)?;
            let title = el.text().collect::<String>().trim().to_string();
            Some(PostLink { url, title })
        })
        .collect()
}

/// Body text of a post page: the first content selector whose trimmed text
/// is longer than 10 chars, else an empty string.
pub fn extract_content(html: &str) -> String {
    let doc = Html::parse_document(html);
    for raw in CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = el
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.chars().count() > MIN_CONTENT_CHARS {
                return text;
            }
        }
    }
    String::new()
}

pub struct DcInsideProvider {
    client: reqwest::Client,
    search_base: String,
    gallery_base: String,
    delay: Duration,
    max_body_chars: usize,
}

impl DcInsideProvider {
    pub fn from_config(cfg: &Config) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3"),
        );
        Self {
            client: http_client(cfg.timeout(), BROWSER_UA, headers),
            search_base: SEARCH_BASE.to_string(),
            gallery_base: GALLERY_BASE.to_string(),
            delay: cfg.request_delay(),
            max_body_chars: cfg.content_max_length,
        }
    }

    /// Point both the search page and relative post links at another host.
    pub fn with_base_urls(mut self, search_base: &str, gallery_base: &str) -> Self {
        self.search_base = search_base.trim_end_matches('/').to_string();
        self.gallery_base = gallery_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn search_url(&self, keyword: &str) -> Result<Url> {
        let mut url = Url::parse(&self.search_base)
            .map_err(|e| Error::Configuration(format!("bad search base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Configuration("search base url cannot have a path".into()))?
            .pop_if_empty()
            .extend(["combine", "q", keyword, "p", "1"]);
        Ok(url)
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "dcinside fetch"));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl SourceAdapter for DcInsideProvider {
    async fn collect(
        &self,
        keyword: &str,
        target_count: usize,
        _range: Option<DateRange>,
    ) -> Result<Vec<PostRecord>> {
        let mut out = Vec::new();
        if target_count == 0 {
            return Ok(out);
        }

        let search_url = self.search_url(keyword)?;
        let page = self.fetch_html(search_url.as_str()).await?;
        debug!(provider = "dcinside", bytes = page.len(), "search page loaded");

        let links = extract_links(&page, &self.gallery_base);
        if links.is_empty() {
            warn!(provider = "dcinside", %keyword, "no post links found on search page");
            return Ok(out);
        }

        let total = links.len().min(target_count);
        for (idx, link) in links.into_iter().take(target_count).enumerate() {
            tokio::time::sleep(self.delay).await;
            debug!(provider = "dcinside", item = idx + 1, total, url = %link.url, "fetching post");

            let content = match self.fetch_html(&link.url).await {
                Ok(html) => extract_content(&html),
                Err(e) => {
                    warn!(provider = "dcinside", url = %link.url, error = %e, "post fetch failed");
                    counter!("collect_errors_total").increment(1);
                    String::new()
                }
            };

            out.push(PostRecord::from_raw(
                Platform::DcInside,
                link.url,
                &link.title,
                &content,
                keyword,
                None,
                self.max_body_chars,
            ));
        }

        let succeeded = out.iter().filter(|r| r.fetch_succeeded).count();
        let success_rate = succeeded as f64 / out.len() as f64 * 100.0;
        info!(
            provider = "dcinside",
            %keyword,
            collected = out.len(),
            succeeded,
            success_rate = %format!("{success_rate:.1}%"),
            "dcinside search done"
        );
        Ok(out)
    }

    fn platform(&self) -> Platform {
        Platform::DcInside
    }
}
