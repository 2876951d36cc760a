// tests/pipeline_e2e.rs
// Forum scrape -> model scoring with fallback -> CSV, all against local mocks.
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

use suicide_risk_monitor::analyze::{analyze_all, KeywordScorer, ModelScorer};
use suicide_risk_monitor::config::{AiConfig, Config};
use suicide_risk_monitor::decision::Method;
use suicide_risk_monitor::ingest::providers::DcInsideProvider;
use suicide_risk_monitor::ingest::{collect_all, SourcePlan};
use suicide_risk_monitor::report::{write_report, ReportStats};

const SEARCH_HTML: &str = include_str!("fixtures/dcinside_search.html");
const POST_HTML: &str = include_str!("fixtures/dcinside_post.html");

#[tokio::test]
async fn scrape_score_and_write() {
    let mut forum = mockito::Server::new_async().await;
    let _search = forum
        .mock("GET", "/combine/q/test/p/1")
        .with_status(200)
        .with_body(SEARCH_HTML)
        .create_async()
        .await;
    let _p1 = forum
        .mock("GET", "/board/view/post1")
        .with_status(200)
        .with_body(POST_HTML)
        .create_async()
        .await;
    let _p2 = forum
        .mock("GET", "/board/view/post2")
        .with_status(200)
        .with_body(r#"<div class="write_div">평범한 일상 이야기를 적어봅니다</div>"#)
        .create_async()
        .await;
    let _missing = forum
        .mock("GET", "/board/view/missing")
        .with_status(404)
        .create_async()
        .await;

    // The first post gets a model answer; the second hits an outage and falls back.
    let mut model = mockito::Server::new_async().await;
    let _ok = model
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("힘들고".into()))
        .with_status(200)
        .with_body(
            json!({ "choices": [{ "message": { "content": "위험도: 0.8\n판정: Y\n근거: 절망감 표현" } }] })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let _down = model
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("평범한".into()))
        .with_status(503)
        .create_async()
        .await;

    let cfg = Config::default();
    let forum_adapter = DcInsideProvider::from_config(&cfg)
        .with_base_urls(&forum.url(), &forum.url())
        .with_delay(Duration::ZERO);
    let plans = vec![SourcePlan::new(Box::new(forum_adapter), 10)];
    let records = collect_all(&["test".to_string()], &plans, None).await;
    assert_eq!(records.len(), 3);

    let ai = AiConfig {
        api_key: Some("sk-e2e-key-0000000000".into()),
        ..AiConfig::default()
    };
    let scorer = ModelScorer::from_config(&ai, Duration::from_secs(5)).with_base_url(&model.url());
    let rows = analyze_all(&records, &scorer, &KeywordScorer::new(cfg.risk_threshold)).await;

    // the 404 post has no body and is not scored
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].method, Method::Model);
    assert_eq!(rows[0].risk_score, 0.8);
    assert_eq!(rows[1].method, Method::Keyword);

    let dir = tempfile::tempdir().unwrap();
    let path = write_report(&rows, dir.path()).unwrap().expect("report");
    assert!(path.exists());

    let stats = ReportStats::from_rows(&rows);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.risky, 1);
}
