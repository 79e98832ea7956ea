use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chat::{client::providers::Provider, prompt::SystemPromptBuilder};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StudyModeConfigTOML {
    pub config: StudyModeConfigInner,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StudyModeConfigInner {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub content: ContentConfig,
    pub rate_limit: RateLimitConfig,
    pub prompt: SystemPromptBuilder,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u64,
    pub temperature: Option<f64>,
    pub timeout_secs: Option<u64>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Mock,
            api_key: String::new(),
            model: None,
            base_url: None,
            max_tokens: 1024,
            temperature: Some(0.7),
            timeout_secs: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Current page plus README summaries, book digest for minimal pages.
    Page,
    /// Current page, referenced topics, chapter summaries, book snippets.
    #[default]
    Tiered,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    pub base_path: PathBuf,
    pub strategy: RetrievalStrategy,
    pub max_context_chars: usize,
    pub minimal_page_chars: usize,
    pub digest_lesson_chars: usize,
    pub referenced_page_chars: usize,
    pub max_referenced_pages: usize,
    pub min_keyword_len: usize,
    pub snippet_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("docs"),
            strategy: RetrievalStrategy::Tiered,
            max_context_chars: 50_000,
            minimal_page_chars: 1000,
            digest_lesson_chars: 3000,
            referenced_page_chars: 8000,
            max_referenced_pages: 3,
            min_keyword_len: 5,
            snippet_chars: 400,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Seconds between expired-entry sweeps; 0 leaves cleanup to the caller.
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60 * 60,
            cleanup_interval_secs: 10 * 60,
        }
    }
}

impl RateLimitConfig {
    /// `window_secs` as a duration. Zero and values chrono can't represent
    /// are rejected.
    pub fn window(&self) -> anyhow::Result<chrono::Duration> {
        i64::try_from(self.window_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "rate_limit.window_secs out of range: {}",
                    self.window_secs
                )
            })
    }
}
