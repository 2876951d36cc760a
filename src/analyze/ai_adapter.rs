//! Model-backed scorer: one chat-completion call per post, reply parsed
//! from a fixed three-line format.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyze::RiskScorer;
use crate::config::AiConfig;
use crate::decision::{Assessment, Method, Verdict};
use crate::error::{Error, Result};

pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Only this many leading chars of a post go into the prompt.
pub const PROMPT_TEXT_CHARS: usize = 500;

const SCORE_LABELS: [&str; 2] = ["위험도", "risk"];
const VERDICT_LABELS: [&str; 2] = ["판정", "verdict"];
const RATIONALE_LABELS: [&str; 2] = ["근거", "rationale"];

/// Build the classification prompt for `text`.
pub fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(PROMPT_TEXT_CHARS).collect();
    format!(
        "다음 텍스트가 자살유발정보에 해당하는지 분석해주세요.\n\
         \n\
         자살유발정보 판단 기준:\n\
         1. 자살동반자 모집정보\n\
         2. 자살에 대한 구체적인 방법을 제시하는 정보\n\
         3. 자살을 실행하거나 유도하는 내용을 담은 정보\n\
         4. 자살위해물건의 판매 또는 활용에 관한 정보\n\
         \n\
         분석할 텍스트:\n\
         {excerpt}\n\
         \n\
         다음 형식으로 정확히 응답해주세요:\n\
         위험도: [0.0-1.0 사이의 숫자]\n\
         판정: [Y 또는 N]\n\
         근거: [구체적인 판단 근거]\n"
    )
}

/// Value after `label` + optional space + `:`; label match is case-insensitive.
fn labelled_value<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    for label in labels {
        let Some(head) = line.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }
        let rest = &line[label.len()..];
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        if let Some(value) = rest.strip_prefix(':') {
            return Some(value.trim());
        }
    }
    None
}

/// Parse a reply of the form
///
/// ```text
/// 위험도: 0.85        (or `risk: 0.85`)
/// 판정: Y             (or `verdict: Y`)
/// 근거: ...           (or `rationale: ...`)
/// ```
///
/// Missing or malformed fields keep their defaults (0.0, not-risky, "").
pub fn parse_reply(reply: &str) -> Assessment {
    let mut score = 0.0f64;
    let mut verdict = Verdict::NotRisky;
    let mut rationale = String::new();

    for raw in reply.lines() {
        let line = raw
            .trim()
            .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•') || c.is_whitespace());

        if let Some(v) = labelled_value(line, &SCORE_LABELS) {
            match v.split_whitespace().next().map(str::parse::<f64>) {
                Some(Ok(s)) if s.is_finite() => score = s,
                _ => warn!(target: "ai", line, "unparseable risk score; keeping default"),
            }
        } else if let Some(v) = labelled_value(line, &VERDICT_LABELS) {
            let token = v
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            match token.as_str() {
                "Y" | "YES" => verdict = Verdict::Risky,
                "N" | "NO" => verdict = Verdict::NotRisky,
                _ => warn!(target: "ai", line, "unparseable verdict; keeping default"),
            }
        } else if let Some(v) = labelled_value(line, &RATIONALE_LABELS) {
            rationale = v.to_string();
        }
    }

    debug!(target: "ai", score, %verdict, "parsed model reply");
    Assessment::new(score, verdict, rationale)
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "openai"));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| Error::Generic(format!("openai: undecodable response: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generic("openai: response had no choices".into()))
    }
}

/// OpenAI-backed scorer. Constructed unavailable when the key is missing or
/// malformed; every `score` call then fails with `Error::Configuration`.
pub struct ModelScorer {
    client: Option<OpenAiClient>,
    unavailable_reason: String,
}

impl ModelScorer {
    pub fn from_config(cfg: &AiConfig, timeout: Duration) -> Self {
        if !cfg.has_valid_key() {
            let reason = if cfg.key_present() {
                "OPENAI_API_KEY is malformed"
            } else {
                "OPENAI_API_KEY is not set"
            };
            warn!(target: "ai", reason, "model scorer unavailable");
            return Self::disabled(reason);
        }

        let http = reqwest::Client::builder()
            .user_agent(crate::ingest::providers::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build();
        let http = match http {
            Ok(h) => h,
            Err(e) => {
                warn!(target: "ai", error = %e, "http client build failed");
                return Self::disabled("http client could not be built");
            }
        };

        info!(
            target: "ai",
            model = %cfg.model,
            key = cfg.masked_key().unwrap_or_default(),
            "model scorer configured"
        );
        Self {
            client: Some(OpenAiClient {
                http,
                base_url: OPENAI_API_BASE.to_string(),
                api_key: cfg.api_key.clone().unwrap_or_default().trim().to_string(),
                model: cfg.model.clone(),
                temperature: cfg.temperature,
                max_tokens: cfg.max_tokens,
            }),
            unavailable_reason: String::new(),
        }
    }

    pub fn disabled(reason: &str) -> Self {
        Self {
            client: None,
            unavailable_reason: reason.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        if let Some(c) = self.client.as_mut() {
            c.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    /// One tiny request to confirm the key and endpoint work. A failed probe
    /// turns the scorer off for the rest of the run.
    pub async fn probe(self) -> Self {
        let Some(client) = self.client.as_ref() else {
            return self;
        };
        match client.complete("Hello", 5).await {
            Ok(_) => {
                info!(target: "ai", "model probe ok");
                self
            }
            Err(e) => {
                warn!(target: "ai", error = %e, "model probe failed; keyword scoring only");
                Self::disabled(&format!("probe failed: {e}"))
            }
        }
    }
}

#[async_trait]
impl RiskScorer for ModelScorer {
    async fn score(&self, text: &str) -> Result<Assessment> {
        let client = self.client.as_ref().ok_or_else(|| {
            Error::Configuration(format!("model scorer unavailable: {}", self.unavailable_reason))
        })?;

        let prompt = build_prompt(text);
        debug!(target: "ai", text_chars = text.chars().count(), prompt_chars = prompt.chars().count(), "calling model");
        let reply = client.complete(&prompt, client.max_tokens).await?;
        debug!(target: "ai", %reply, "model reply");
        Ok(parse_reply(&reply))
    }

    fn method(&self) -> Method {
        Method::Model
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_reply() {
        let a = parse_reply("위험도: 0.85\n판정: Y\n근거: test");
        assert_eq!(a.risk_score, 0.85);
        assert_eq!(a.verdict, Verdict::Risky);
        assert_eq!(a.rationale, "test");
    }

    #[test]
    fn english_reply_with_space_before_colon() {
        let a = parse_reply("risk : 0.2\nVerdict : n\nrationale : calm post");
        assert_eq!(a.risk_score, 0.2);
        assert_eq!(a.verdict, Verdict::NotRisky);
        assert_eq!(a.rationale, "calm post");
    }

    #[test]
    fn rationale_keeps_colons() {
        let a = parse_reply("근거: 방법 언급: 구체적");
        assert_eq!(a.rationale, "방법 언급: 구체적");
    }

    #[test]
    fn malformed_and_out_of_range_values() {
        let a = parse_reply("위험도: high\n판정: maybe");
        assert_eq!(a, Assessment::default());

        let b = parse_reply("위험도: 1.4");
        assert_eq!(b.risk_score, 1.0);
    }

    #[test]
    fn bullets_are_tolerated() {
        let a = parse_reply("- 위험도: 0.6\n- 판정: Y");
        assert_eq!(a.risk_score, 0.6);
        assert!(a.verdict.is_risky());
    }

    #[test]
    fn prompt_truncates_text() {
        let text = "가".repeat(800);
        let prompt = build_prompt(&text);
        assert!(prompt.contains(&"가".repeat(500)));
        assert!(!prompt.contains(&"가".repeat(501)));
        assert!(prompt.contains("자살동반자 모집정보"));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let scorer = ModelScorer::from_config(&AiConfig::default(), Duration::from_secs(1));
        assert!(!scorer.is_available());
        let err = scorer.score("anything").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
