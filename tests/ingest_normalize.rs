// tests/ingest_normalize.rs
use suicide_risk_monitor::ingest::normalize_text;

#[test]
fn empty_is_ok() {
    assert_eq!(normalize_text("", 1000), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>힘들다&nbsp;<b>정말</b> &ldquo;끝&rdquo;</p>";
    assert_eq!(normalize_text(s, 1000), "힘들다 정말 \u{201C}끝\u{201D}");
}

#[test]
fn folds_whitespace_and_nbsp() {
    let s = "A\u{00A0}\n\tB   C";
    assert_eq!(normalize_text(s, 1000), "A B C");
}

#[test]
fn length_cap_applies_after_cleanup() {
    let s = format!("<div>{}</div>", "x".repeat(2_000));
    let n = normalize_text(&s, 1000);
    assert_eq!(n.chars().count(), 1000);
    assert!(!n.contains('<'));
}

#[test]
fn multiline_tags_are_removed() {
    let s = "<a\n href=\"x\">링크</a>";
    assert_eq!(normalize_text(s, 1000), "링크");
}
