use std::{fmt::Display, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{anthropic, mock::MockClient, openai};
use crate::chat::{ChatError, ChatMessage, ChatMode};

/// Everything a backend needs for one completion.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub mode: ChatMode,
    pub lesson_title: String,
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub prompt: String,
    pub max_tokens: u64,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: u64,
}

#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// `provider/model`, used for logs and the health endpoint.
    fn name(&self) -> String;

    async fn completion(&self, request: ModelRequest) -> Result<ProviderResponse, ChatError>;
}

#[derive(Clone)]
pub enum ProviderClient {
    Anthropic(anthropic::Client),
    Mock(MockClient),
    OpenAI(openai::Client),
}

impl ProviderClient {
    pub fn completion_model(&self, model: &str) -> Arc<dyn CompletionModel> {
        match self {
            ProviderClient::Anthropic(client) => Arc::new(client.completion_model(model)),
            ProviderClient::Mock(client) => Arc::new(client.clone()),
            ProviderClient::OpenAI(client) => Arc::new(client.completion_model(model)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "anthropic")]
    #[serde(alias = "claude")]
    Anthropic,

    #[serde(rename = "mock")]
    #[default]
    Mock,

    #[serde(rename = "openai")]
    #[serde(alias = "openai-compatible")]
    OpenAI,
}

impl TryFrom<String> for Provider {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_plain::from_str(value.trim()).map_err(|e| anyhow::anyhow!("{}", e))
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_plain::to_string(self)
            .map_err(|_| std::fmt::Error)?
            .fmt(f)
    }
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => anthropic::DEFAULT_MODEL,
            Provider::Mock => super::mock::MODEL,
            Provider::OpenAI => openai::DEFAULT_MODEL,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Mock)
    }

    pub fn client(
        &self,
        api_key: &str,
        custom_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<ProviderClient> {
        let http = http_client(timeout)?;

        Ok(match self {
            Provider::Anthropic => ProviderClient::Anthropic(anthropic::Client::new(
                http,
                api_key,
                custom_url.unwrap_or(anthropic::BASE_URL),
            )),
            Provider::Mock => ProviderClient::Mock(MockClient::default()),
            Provider::OpenAI => ProviderClient::OpenAI(openai::Client::new(
                http,
                api_key,
                custom_url.unwrap_or(openai::BASE_URL),
            )),
        })
    }
}

/// Turns a transport failure or non-2xx reply into `AI_UNAVAILABLE`.
pub(super) async fn check_response(
    label: &str,
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<reqwest::Response, ChatError> {
    let response = result.map_err(|why| {
        log::warn!("{label} request failed: {why}");
        ChatError::AiUnavailable(format!("Failed to connect to {label}"))
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ChatError::AiUnavailable(format!(
        "{label} API error: {} {}",
        status.as_u16(),
        body.trim()
    )))
}

fn http_client(timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}
