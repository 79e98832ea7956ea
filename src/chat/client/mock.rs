use async_trait::async_trait;
use indexmap::IndexMap;

use super::providers::{CompletionModel, ModelRequest, ProviderResponse};
use crate::chat::{ChatError, ChatMode};

pub const MODEL: &str = "mock-model";
pub const DEFAULT_RESPONSE: &str = "This is a mock AI response for testing.";

/// An offline backend. Canned replies are keyed by a lowercase keyword and
/// checked in insertion order; the first keyword found in the message wins.
#[derive(Debug, Clone)]
pub struct MockClient {
    responses: IndexMap<String, String>,
    default_response: String,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            responses: IndexMap::new(),
            default_response: DEFAULT_RESPONSE.to_string(),
        }
    }
}

impl MockClient {
    pub fn with_response(mut self, keyword: &str, response: &str) -> Self {
        self.responses
            .insert(keyword.to_lowercase(), response.to_string());
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    fn reply(&self, request: &ModelRequest) -> String {
        let message = request.prompt.to_lowercase();

        if let Some(response) = self
            .responses
            .iter()
            .find(|(keyword, _)| message.contains(keyword.as_str()))
            .map(|(_, response)| response)
        {
            return response.clone();
        }

        match request.mode {
            ChatMode::Teach => format!(
                "Let me explain the concept from \"{}\". {}",
                request.lesson_title, self.default_response
            ),
            ChatMode::Ask => format!(
                "Based on the lesson \"{}\": {}",
                request.lesson_title, self.default_response
            ),
        }
    }
}

#[async_trait]
impl CompletionModel for MockClient {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn completion(&self, request: ModelRequest) -> Result<ProviderResponse, ChatError> {
        let content = self.reply(&request);

        Ok(ProviderResponse {
            tokens_used: content.chars().count() as u64,
            model: MODEL.to_string(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: ChatMode, prompt: &str) -> ModelRequest {
        ModelRequest {
            mode,
            lesson_title: "Nine Pillars".to_string(),
            system_prompt: String::new(),
            history: Vec::new(),
            prompt: prompt.to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn default_reply_names_the_lesson() {
        let mock = MockClient::default();

        let teach = mock.completion(request(ChatMode::Teach, "hi")).await.unwrap();
        let ask = mock.completion(request(ChatMode::Ask, "hi")).await.unwrap();

        assert_eq!(
            teach.content,
            "Let me explain the concept from \"Nine Pillars\". This is a mock AI response for testing."
        );
        assert!(ask.content.starts_with("Based on the lesson \"Nine Pillars\":"));
        assert_eq!(teach.model, MODEL);
        assert_eq!(teach.tokens_used, teach.content.chars().count() as u64);
    }

    #[tokio::test]
    async fn first_keyword_in_insertion_order_wins() {
        let mock = MockClient::default()
            .with_response("Pillar", "pillar answer")
            .with_response("nine", "nine answer");

        let response = mock
            .completion(request(ChatMode::Ask, "what are the nine pillars?"))
            .await
            .unwrap();

        assert_eq!(response.content, "pillar answer");
        assert_eq!(response.tokens_used, 13);
    }

    #[tokio::test]
    async fn custom_default() {
        let mock = MockClient::default().with_default_response("canned");

        let response = mock.completion(request(ChatMode::Ask, "hi")).await.unwrap();

        assert_eq!(response.content, "Based on the lesson \"Nine Pillars\": canned");
    }
}
