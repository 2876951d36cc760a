// src/config/ai.rs
use serde::{Deserialize, Serialize};

/// Keys that do not start with this prefix are treated as malformed.
pub const OPENAI_KEY_PREFIX: &str = "sk-";

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// `"ENV"` means: read from OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AiConfig {
    /// Resolve the `"ENV"` placeholder and apply env overrides.
    pub(crate) fn apply_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let placeholder = self
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().eq_ignore_ascii_case("env"));
        if placeholder {
            self.api_key = None;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.model = model;
        }
    }

    pub fn key_present(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Present and shaped like an OpenAI key.
    pub fn has_valid_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| k.trim().starts_with(OPENAI_KEY_PREFIX))
    }

    /// First 10 and last 4 chars only; safe for logs.
    pub fn masked_key(&self) -> Option<String> {
        let key = self.api_key.as_deref()?.trim();
        let chars: Vec<char> = key.chars().collect();
        let head: String = chars.iter().take(10).collect();
        let tail: String = if chars.len() > 14 {
            chars[chars.len() - 4..].iter().collect()
        } else {
            String::new()
        };
        Some(format!("{head}...{tail}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_placeholder_is_resolved() {
        let mut cfg = AiConfig {
            api_key: Some("ENV".into()),
            ..AiConfig::default()
        };
        let env: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk-abcdef")].into();
        cfg.apply_env(&|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_key.as_deref(), Some("sk-abcdef"));
        assert!(cfg.has_valid_key());
    }

    #[test]
    fn placeholder_without_env_means_no_key() {
        let mut cfg = AiConfig {
            api_key: Some("env".into()),
            ..AiConfig::default()
        };
        cfg.apply_env(&|_| None);
        assert!(!cfg.key_present());
    }

    #[test]
    fn prefix_is_required() {
        let cfg = AiConfig {
            api_key: Some("pk-123".into()),
            ..AiConfig::default()
        };
        assert!(cfg.key_present());
        assert!(!cfg.has_valid_key());
    }

    #[test]
    fn masked_key_hides_the_middle() {
        let cfg = AiConfig {
            api_key: Some("sk-1234567890abcdefWXYZ".into()),
            ..AiConfig::default()
        };
        assert_eq!(cfg.masked_key().as_deref(), Some("sk-1234567...WXYZ"));
    }
}
