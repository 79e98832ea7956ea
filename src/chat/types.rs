use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::ChatError;

pub const LESSON_PATH_MAX: usize = 500;
pub const USER_MESSAGE_MIN: usize = 1;
pub const USER_MESSAGE_MAX: usize = 5000;
pub const CONVERSATION_HISTORY_MAX: usize = 50;

pub const VALIDATION_MESSAGE: &str = "Invalid request. Check lessonPath, userMessage, and mode.";

/// How the tutor behaves.
///
/// `teach` leads the student through the page one concept at a time and
/// closes every turn with questions. `ask` answers only what was asked.
/// Both draw on the book content alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Teach,
    Ask,
}

impl Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_plain::to_string(self)
            .map_err(|_| std::fmt::Error)?
            .fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// ISO-8601 by convention, passed through untouched.
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub lesson_path: String,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    pub mode: ChatMode,
}

impl ChatRequest {
    /// Parses and validates a request body. Anything malformed, including a
    /// body that is not a JSON object, is a validation error.
    pub fn parse(body: &[u8]) -> Result<Self, ChatError> {
        let request: Self = serde_json::from_slice(body).map_err(|why| {
            log::debug!("rejected chat body: {why}");
            ChatError::Validation(VALIDATION_MESSAGE.to_string())
        })?;

        request.validate()?;

        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        let path_len = self.lesson_path.chars().count();
        let message_len = self.user_message.chars().count();

        let valid = (1..=LESSON_PATH_MAX).contains(&path_len)
            && (USER_MESSAGE_MIN..=USER_MESSAGE_MAX).contains(&message_len)
            && self.conversation_history.len() <= CONVERSATION_HISTORY_MAX;

        match valid {
            true => Ok(()),
            false => Err(ChatError::Validation(VALIDATION_MESSAGE.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub model: String,
    pub tokens_used: u64,
    pub processing_time_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub assistant_message: String,
    pub metadata: ResponseMetadata,
}
