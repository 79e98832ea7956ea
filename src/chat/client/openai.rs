use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::providers::{CompletionModel, ModelRequest, ProviderResponse, check_response};
use crate::chat::ChatError;

pub const BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const LABEL: &str = "OpenAI";

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

    pub fn completion_model(&self, model: &str) -> OpenAICompletionModel {
        OpenAICompletionModel {
            client: self.clone(),
            model: model.to_string(),
        }
    }
}

pub struct OpenAICompletionModel {
    client: Client,
    model: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[async_trait]
impl CompletionModel for OpenAICompletionModel {
    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn completion(&self, request: ModelRequest) -> Result<ProviderResponse, ChatError> {
        // system, then history, then the new message
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: &request.system_prompt,
        });
        messages.extend(request.history.iter().map(|message| WireMessage {
            role: message.role.as_str(),
            content: &message.content,
        }));
        messages.push(WireMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let result = self
            .client
            .http
            .post(format!("{}/v1/chat/completions", self.client.base_url))
            .bearer_auth(&self.client.api_key)
            .json(&body)
            .send()
            .await;
        let response = check_response(LABEL, result).await?;

        let invalid = || ChatError::AiUnavailable(format!("Invalid {LABEL} response format"));

        let data: ChatCompletionResponse = response.json().await.map_err(|_| invalid())?;
        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(invalid)?;

        Ok(ProviderResponse {
            content,
            model: self.model.clone(),
            tokens_used: data.usage.map(|usage| usage.total_tokens).unwrap_or(0),
        })
    }
}
