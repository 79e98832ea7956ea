use std::{sync::Arc, time::Instant};

use chrono::Utc;

use super::{
    ChatError, ChatRequest, ChatResponse, ResponseMetadata,
    client::{CompletionAgent, CompletionRequest},
};
use crate::{
    config::{store::StudyModeConfig, structure::RetrievalStrategy},
    lesson::{LessonContext, LessonLoader},
    limiter::RateLimiter,
    utils::misc::seconds_until,
};

/// The `/api/chat` pipeline: rate limit, validate, load the lesson, then ask
/// the model. Message text never reaches the logs.
pub struct ChatService {
    limiter: Arc<RateLimiter>,
    lessons: Arc<LessonLoader>,
    agent: CompletionAgent,
}

impl ChatService {
    pub fn new(config: &StudyModeConfig) -> anyhow::Result<Self> {
        let agent = CompletionAgent::new(&config.llm, config.prompt.clone())?;

        Ok(Self::with_parts(
            Arc::new(RateLimiter::from_config(&config.rate_limit)?),
            Arc::new(LessonLoader::new(config.content.clone())),
            agent,
        ))
    }

    pub fn with_parts(
        limiter: Arc<RateLimiter>,
        lessons: Arc<LessonLoader>,
        agent: CompletionAgent,
    ) -> Self {
        Self {
            limiter,
            lessons,
            agent,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn model_name(&self) -> String {
        self.agent.model_name()
    }

    pub async fn handle(&self, client_ip: &str, body: &[u8]) -> Result<ChatResponse, ChatError> {
        let started = Instant::now();

        let rate = self.limiter.check(client_ip).await;
        if !rate.allowed {
            let retry_after = seconds_until(rate.reset_at, Utc::now());
            log::warn!("event=rate_limited ip={client_ip} retry_after={retry_after}");
            return Err(ChatError::RateLimited { retry_after });
        }

        let request = match ChatRequest::parse(body) {
            Ok(request) => request,
            Err(why) => {
                log::info!("event=validation_error ip={client_ip}");
                return Err(why);
            }
        };

        let result = self.respond(&request, started).await;

        if let Err(why) = &result {
            let elapsed = started.elapsed().as_millis();
            match why {
                ChatError::Internal(inner) => log::error!(
                    "event=internal_error ip={client_ip} lesson={} elapsed_ms={elapsed} error={inner:#}",
                    request.lesson_path
                ),
                other => log::warn!(
                    "event=error ip={client_ip} lesson={} mode={} code={} elapsed_ms={elapsed} error=\"{other}\"",
                    request.lesson_path,
                    request.mode,
                    other.code().as_str(),
                ),
            }
        }

        result
    }

    async fn respond(
        &self,
        request: &ChatRequest,
        started: Instant,
    ) -> Result<ChatResponse, ChatError> {
        let (lesson, general) = self.lesson_context(request).await?;

        let response = self
            .agent
            .completion(CompletionRequest {
                lesson: &lesson,
                user_message: &request.user_message,
                history: &request.conversation_history,
                mode: request.mode,
            })
            .await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        log::info!(
            "event={} lesson={} mode={} model={} tokens={} elapsed_ms={processing_time_ms}",
            match general {
                true => "chat_general_mode",
                false => "chat_success",
            },
            request.lesson_path,
            request.mode,
            response.model,
            response.tokens_used,
        );

        Ok(ChatResponse {
            assistant_message: response.content,
            metadata: ResponseMetadata {
                model: response.model,
                tokens_used: response.tokens_used,
                processing_time_ms,
            },
        })
    }

    /// The lesson for the request, or index-page guidance when the path is a
    /// part or chapter directory with nothing readable in it. The flag is
    /// true for guidance.
    async fn lesson_context(
        &self,
        request: &ChatRequest,
    ) -> Result<(LessonContext, bool), ChatError> {
        let path = request.lesson_path.as_str();

        let loaded = match self.lessons.config().strategy {
            RetrievalStrategy::Page => self.lessons.load(path).await,
            RetrievalStrategy::Tiered => self.lessons.retrieve(path, &request.user_message).await,
        };

        match loaded {
            Ok(lesson) => Ok((lesson, false)),
            Err(ChatError::LessonNotFound(why)) => {
                if !self.lessons.is_index_page(path).await {
                    return Err(ChatError::LessonNotFound(why));
                }

                log::debug!("{path} is an index page, answering with book guidance");
                Ok((self.guidance(path).await, true))
            }
            Err(why) => Err(why),
        }
    }

    async fn guidance(&self, path: &str) -> LessonContext {
        let prompts = self.agent.prompts();
        let outline = self.lessons.book_outline().await;

        LessonContext {
            path: path.to_string(),
            title: prompts.guidance_title(),
            content: prompts.guidance(&outline),
            chapter_number: None,
            lesson_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::{
        chat::{ErrorCode, client::mock::MockClient, prompt::SystemPromptBuilder},
        config::structure::{ContentConfig, LLMConfig},
        lesson::tests::BookFixture,
    };

    fn service(content: ContentConfig, max_requests: u32, mock: MockClient) -> ChatService {
        ChatService::with_parts(
            Arc::new(RateLimiter::new(max_requests, Duration::hours(1))),
            Arc::new(LessonLoader::new(content)),
            CompletionAgent::with_model(
                Arc::new(mock),
                SystemPromptBuilder::default(),
                &LLMConfig::default(),
            ),
        )
    }

    fn body(path: &str, message: &str, mode: &str) -> Vec<u8> {
        json!({
            "lessonPath": path,
            "userMessage": message,
            "conversationHistory": [],
            "mode": mode
        })
        .to_string()
        .into_bytes()
    }

    const LESSON: &str = "/docs/foundations/agent-factory/inflection-point";

    #[tokio::test]
    async fn teach_reply_names_the_lesson() {
        let book = BookFixture::new();
        let chat = service(book.config(), 10, MockClient::default());

        let response = chat
            .handle("10.0.0.1", &body(LESSON, "Explain this", "teach"))
            .await
            .unwrap();

        assert!(response.assistant_message.contains("The 2025 Inflection Point"));
        assert!(response.assistant_message.starts_with("Let me explain"));
        assert_eq!(response.metadata.model, "mock-model");
        assert!(response.metadata.tokens_used > 0);
    }

    #[tokio::test]
    async fn ask_mode_with_page_strategy() {
        let book = BookFixture::new();
        let mut content = book.config();
        content.strategy = RetrievalStrategy::Page;
        let chat = service(content, 10, MockClient::default());

        let response = chat
            .handle("10.0.0.1", &body(LESSON, "What is it?", "ask"))
            .await
            .unwrap();

        assert!(response.assistant_message.starts_with("Based on the lesson \"The 2025 Inflection Point\""));
    }

    #[tokio::test]
    async fn keyword_responses_pass_through() {
        let book = BookFixture::new();
        let mock = MockClient::default().with_response("pillars", "Pillars answer");
        let chat = service(book.config(), 10, mock);

        let response = chat
            .handle("10.0.0.1", &body(LESSON, "Tell me about the PILLARS", "ask"))
            .await
            .unwrap();

        assert_eq!(response.assistant_message, "Pillars answer");
    }

    #[tokio::test]
    async fn invalid_body_is_a_validation_error() {
        let book = BookFixture::new();
        let chat = service(book.config(), 10, MockClient::default());

        let err = chat.handle("10.0.0.1", b"{\"mode\":\"teach\"}").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn unknown_lesson_is_not_found() {
        let book = BookFixture::new();
        let chat = service(book.config(), 10, MockClient::default());

        let err = chat
            .handle("10.0.0.1", &body("/docs/nonexistent/lesson", "hi", "teach"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::LessonNotFound);
    }

    #[tokio::test]
    async fn index_pages_get_guidance() {
        let book = BookFixture::new();
        let chat = service(book.config(), 10, MockClient::default());

        let response = chat
            .handle(
                "10.0.0.1",
                &body("/docs/custom-agents/empty-chapter", "Where do I start?", "ask"),
            )
            .await
            .unwrap();

        assert!(response.assistant_message.contains("AgentFactory Book"));
    }

    #[tokio::test]
    async fn blocked_clients_get_retry_after() {
        let book = BookFixture::new();
        let chat = service(book.config(), 1, MockClient::default());

        chat.handle("10.0.0.2", &body(LESSON, "one", "ask")).await.unwrap();
        let err = chat
            .handle("10.0.0.2", &body(LESSON, "two", "ask"))
            .await
            .unwrap_err();

        match err {
            ChatError::RateLimited { retry_after } => {
                assert!((3599..=3600).contains(&retry_after))
            }
            other => panic!("expected rate limit, got {other:?}"),
        }

        // another client is unaffected
        assert!(chat.handle("10.0.0.3", &body(LESSON, "three", "ask")).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_requests_still_count() {
        let book = BookFixture::new();
        let chat = service(book.config(), 1, MockClient::default());

        chat.handle("10.0.0.4", b"nope").await.unwrap_err();
        let err = chat
            .handle("10.0.0.4", &body(LESSON, "hi", "ask"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::RateLimited);
    }
}
