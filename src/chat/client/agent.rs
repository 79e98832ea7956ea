use std::{sync::Arc, time::Duration};

use super::providers::{CompletionModel, ModelRequest, Provider, ProviderResponse};
use crate::{
    chat::{ChatError, ChatMessage, ChatMode, prompt::SystemPromptBuilder},
    config::structure::LLMConfig,
    lesson::LessonContext,
};

/// One student turn, ready to be sent.
pub struct CompletionRequest<'a> {
    pub lesson: &'a LessonContext,
    pub user_message: &'a str,
    pub history: &'a [ChatMessage],
    pub mode: ChatMode,
}

/// Pairs a completion backend with the prompt settings, so callers only
/// deal in lessons and messages.
pub struct CompletionAgent {
    completion_model: Arc<dyn CompletionModel>,
    prompts: SystemPromptBuilder,
    max_tokens: u64,
    temperature: Option<f64>,
}

impl CompletionAgent {
    pub fn new(config: &LLMConfig, prompts: SystemPromptBuilder) -> anyhow::Result<Self> {
        let mut provider = config.provider;

        if provider.requires_api_key() && config.api_key.trim().is_empty() {
            log::warn!("no api key configured for {provider}, falling back to the mock provider");
            provider = Provider::Mock;
        }

        let model = match (provider, config.model.as_deref()) {
            (Provider::Mock, _) => provider.default_model(),
            (_, Some(model)) if !model.trim().is_empty() => model,
            _ => provider.default_model(),
        };

        let client = provider.client(
            &config.api_key,
            config.base_url.as_deref(),
            config.timeout_secs.map(Duration::from_secs),
        )?;

        let agent = Self::with_model(client.completion_model(model), prompts, config);
        log::info!("completion model: {}", agent.model_name());

        Ok(agent)
    }

    pub fn with_model(
        completion_model: Arc<dyn CompletionModel>,
        prompts: SystemPromptBuilder,
        config: &LLMConfig,
    ) -> Self {
        Self {
            completion_model,
            prompts,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn model_name(&self) -> String {
        self.completion_model.name()
    }

    pub fn prompts(&self) -> &SystemPromptBuilder {
        &self.prompts
    }

    pub fn request(&self, request: &CompletionRequest<'_>) -> ModelRequest {
        ModelRequest {
            mode: request.mode,
            lesson_title: request.lesson.title.clone(),
            system_prompt: self
                .prompts
                .build(request.mode, request.lesson)
                .into_inner(),
            history: request.history.to_vec(),
            prompt: request.user_message.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub async fn completion(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<ProviderResponse, ChatError> {
        self.completion_model
            .completion(self.request(&request))
            .await
    }
}
