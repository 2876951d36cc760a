// src/ingest/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::ingest::normalize_text;

/// Upstream a post was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Twitter,
    NaverBlog,
    DcInside,
}

impl Platform {
    /// Menu order; indices shown to the user are 1-based positions in this list.
    pub const ALL: [Platform; 3] = [Platform::Twitter, Platform::NaverBlog, Platform::DcInside];

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Twitter => "X(Twitter)",
            Platform::NaverBlog => "Naver Blog",
            Platform::DcInside => "DCInside",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Platform::Twitter => "recent tweets via the Twitter API",
            Platform::NaverBlog => "blog posts via the Naver search API",
            Platform::DcInside => "forum posts via page scraping",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Inclusive calendar range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// One normalized post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub source: Platform,
    pub url: String,
    pub title: String,
    pub body_text: String,
    pub search_keyword: String,
    pub created_at: Option<DateTime<Utc>>,
    pub fetch_succeeded: bool,
    pub author: Option<String>,
}

impl PostRecord {
    /// Build a record from raw upstream fields: strips HTML from title and
    /// body and caps the body at `max_body_chars`.
    pub fn from_raw(
        source: Platform,
        url: impl Into<String>,
        raw_title: &str,
        raw_body: &str,
        keyword: &str,
        created_at: Option<DateTime<Utc>>,
        max_body_chars: usize,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            title: normalize_text(raw_title, usize::MAX),
            body_text: normalize_text(raw_body, max_body_chars),
            search_keyword: keyword.to_string(),
            created_at,
            fetch_succeeded: !raw_body.trim().is_empty(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }
}

/// Capability shared by every source. Implementations catch per-item and
/// per-page failures themselves; `Err` means the source produced nothing
/// at all (missing credentials, first request failed).
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn collect(
        &self,
        keyword: &str,
        target_count: usize,
        range: Option<DateRange>,
    ) -> Result<Vec<PostRecord>>;

    fn platform(&self) -> Platform;
}
