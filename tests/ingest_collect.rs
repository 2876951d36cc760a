// tests/ingest_collect.rs
use async_trait::async_trait;
use std::sync::Mutex;

use suicide_risk_monitor::error::{Error, Result};
use suicide_risk_monitor::ingest::types::{DateRange, Platform, PostRecord, SourceAdapter};
use suicide_risk_monitor::ingest::{collect_all, SourcePlan};

/// Returns `per_call` records per keyword and remembers what it was asked.
struct StubAdapter {
    platform: Platform,
    per_call: usize,
    fail_on: Option<&'static str>,
    calls: std::sync::Arc<Mutex<Vec<(String, usize)>>>,
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    async fn collect(
        &self,
        keyword: &str,
        target_count: usize,
        _range: Option<DateRange>,
    ) -> Result<Vec<PostRecord>> {
        self.calls.lock().unwrap().push((keyword.to_string(), target_count));
        if self.fail_on == Some(keyword) {
            return Err(Error::Transient("boom".into()));
        }
        Ok((0..self.per_call)
            .map(|i| {
                PostRecord::from_raw(
                    self.platform,
                    format!("https://example.test/{keyword}/{i}"),
                    "",
                    "본문",
                    keyword,
                    None,
                    1000,
                )
            })
            .collect())
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

fn plan(
    platform: Platform,
    per_call: usize,
    target: usize,
    fail_on: Option<&'static str>,
) -> (SourcePlan, std::sync::Arc<Mutex<Vec<(String, usize)>>>) {
    let calls = std::sync::Arc::new(Mutex::new(Vec::new()));
    let adapter = StubAdapter {
        platform,
        per_call,
        fail_on,
        calls: calls.clone(),
    };
    (SourcePlan::new(Box::new(adapter), target), calls)
}

fn keywords(ks: &[&str]) -> Vec<String> {
    ks.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn keyword_major_order_and_concatenation() {
    let (twitter, t_calls) = plan(Platform::Twitter, 2, 5, None);
    let (naver, n_calls) = plan(Platform::NaverBlog, 1, 7, None);
    let records = collect_all(&keywords(&["a", "b"]), &[twitter, naver], None).await;

    let order: Vec<_> = records
        .iter()
        .map(|r| (r.search_keyword.as_str(), r.source))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a", Platform::Twitter),
            ("a", Platform::Twitter),
            ("a", Platform::NaverBlog),
            ("b", Platform::Twitter),
            ("b", Platform::Twitter),
            ("b", Platform::NaverBlog),
        ]
    );
    assert_eq!(*t_calls.lock().unwrap(), vec![("a".to_string(), 5), ("b".to_string(), 5)]);
    assert_eq!(*n_calls.lock().unwrap(), vec![("a".to_string(), 7), ("b".to_string(), 7)]);
}

#[tokio::test]
async fn failing_pair_contributes_nothing() {
    let (flaky, _) = plan(Platform::Twitter, 3, 10, Some("bad"));
    let (steady, _) = plan(Platform::DcInside, 1, 10, None);
    let records = collect_all(&keywords(&["bad", "good"]), &[flaky, steady], None).await;

    assert_eq!(records.len(), 1 + 3 + 1);
    assert!(!records
        .iter()
        .any(|r| r.search_keyword == "bad" && r.source == Platform::Twitter));
}

#[tokio::test]
async fn oversized_results_are_cut_to_target() {
    let (greedy, _) = plan(Platform::NaverBlog, 9, 4, None);
    let records = collect_all(&keywords(&["k"]), &[greedy], None).await;
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn no_keywords_no_calls() {
    let (p, calls) = plan(Platform::Twitter, 1, 1, None);
    assert!(collect_all(&[], &[p], None).await.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}
