// tests/report_writer.rs
use chrono::{TimeZone, Utc};
use std::fs;

use suicide_risk_monitor::decision::{Assessment, Method, Verdict};
use suicide_risk_monitor::ingest::types::{Platform, PostRecord};
use suicide_risk_monitor::report::{write_report, ReportRow, ReportStats};

fn row(source: Platform, body: &str, verdict: Verdict, score: f64) -> ReportRow {
    let record = PostRecord::from_raw(
        source,
        "https://example.test/p",
        "제목, 쉼표 포함",
        body,
        "우울",
        None,
        usize::MAX,
    );
    ReportRow::new(
        &record,
        Assessment::new(score, verdict, "근거"),
        Method::Keyword,
        Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap(),
    )
}

#[test]
fn empty_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results");
    assert_eq!(write_report(&[], &out).unwrap(), None);
    assert!(!out.exists());
}

#[test]
fn csv_has_bom_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/results");
    let rows = vec![
        row(Platform::DcInside, "첫 번째 본문", Verdict::Risky, 0.4),
        row(Platform::NaverBlog, &"가".repeat(600), Verdict::NotRisky, 0.1),
    ];

    let path = write_report(&rows, &out).unwrap().expect("file written");
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("suicide_monitoring_result_"));
    assert!(name.ends_with(".csv"));

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers[0], "collected_at");
    assert!(headers.contains(&"risk_score".to_string()));
    assert!(headers.contains(&"method".to_string()));

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    assert_eq!(&records[0][col("source")], "DCInside");
    assert_eq!(&records[0][col("title")], "제목, 쉼표 포함");
    assert_eq!(&records[0][col("verdict")], "risky");
    assert_eq!(&records[0][col("risk_score")], "0.40");
    assert_eq!(&records[0][col("method")], "keyword");
    assert_eq!(&records[0][col("collected_at")], "2025-03-05 12:00:00");

    let long_body = &records[1][col("body_text")];
    assert_eq!(long_body.chars().count(), 503);
    assert!(long_body.ends_with("..."));
}

#[test]
fn stats_per_source() {
    let mut failed = row(Platform::DcInside, "", Verdict::NotRisky, 0.0);
    failed.fetch_succeeded = false;
    let rows = vec![
        row(Platform::DcInside, "a", Verdict::Risky, 0.5),
        failed,
        row(Platform::Twitter, "b", Verdict::NotRisky, 0.0),
        row(Platform::Twitter, "c", Verdict::NotRisky, 0.1),
    ];
    let stats = ReportStats::from_rows(&rows);

    assert_eq!(stats.total, 4);
    assert_eq!(stats.risky, 1);
    assert_eq!(stats.overall_risk_rate(), 0.25);

    let dc = stats.per_source[&Platform::DcInside];
    assert_eq!((dc.total, dc.succeeded, dc.risky), (2, 1, 1));
    assert_eq!(dc.success_rate(), 0.5);
    assert_eq!(dc.risk_rate(), 0.5);
    assert!(!stats.per_source.contains_key(&Platform::NaverBlog));

    let rendered = stats.render();
    assert!(rendered.contains("DCInside: 2 collected, success rate 50.0%, risk rate 50.0%"));
    assert!(rendered.contains("Overall risk rate: 25.0%"));
}
