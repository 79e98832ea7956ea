use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::providers::{CompletionModel, ModelRequest, ProviderResponse, check_response};
use crate::chat::ChatError;

pub const BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const API_VERSION: &str = "2023-06-01";

const LABEL: &str = "Anthropic";

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Client {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn completion_model(&self, model: &str) -> AnthropicCompletionModel {
        AnthropicCompletionModel {
            client: self.clone(),
            model: model.to_string(),
        }
    }
}

pub struct AnthropicCompletionModel {
    client: Client,
    model: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u64,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[async_trait]
impl CompletionModel for AnthropicCompletionModel {
    fn name(&self) -> String {
        format!("anthropic/{}", self.model)
    }

    async fn completion(&self, request: ModelRequest) -> Result<ProviderResponse, ChatError> {
        // the system prompt travels separately
        let mut messages: Vec<WireMessage> = request
            .history
            .iter()
            .map(|message| WireMessage {
                role: message.role.as_str(),
                content: &message.content,
            })
            .collect();
        messages.push(WireMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system_prompt,
            messages,
            temperature: request.temperature,
        };

        let result = self
            .client
            .http
            .post(format!("{}/v1/messages", self.client.base_url))
            .header("x-api-key", &self.client.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await;
        let response = check_response(LABEL, result).await?;

        let invalid = || ChatError::AiUnavailable(format!("Invalid {LABEL} response format"));

        let data: MessagesResponse = response.json().await.map_err(|_| invalid())?;
        let content = data
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(invalid)?;

        Ok(ProviderResponse {
            content,
            model: self.model.clone(),
            tokens_used: data
                .usage
                .map(|usage| usage.input_tokens + usage.output_tokens)
                .unwrap_or(0),
        })
    }
}
