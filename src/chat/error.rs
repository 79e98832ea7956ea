use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    RateLimited,
    LessonNotFound,
    AiUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::LessonNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::LessonNotFound => "LESSON_NOT_FOUND",
            ErrorCode::AiUnavailable => "AI_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: u64 },

    #[error("{0}")]
    LessonNotFound(String),

    #[error("{0}")]
    AiUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::Validation(_) => ErrorCode::ValidationError,
            ChatError::RateLimited { .. } => ErrorCode::RateLimited,
            ChatError::LessonNotFound(_) => ErrorCode::LessonNotFound,
            ChatError::AiUnavailable(_) => ErrorCode::AiUnavailable,
            ChatError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// What the client gets to see; internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ChatError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

impl From<&ChatError> for ErrorBody {
    fn from(error: &ChatError) -> Self {
        Self {
            error: ErrorDetail {
                code: error.code(),
                message: error.public_message(),
            },
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.code().status();
        let mut response = (status, Json(ErrorBody::from(&self))).into_response();

        if let ChatError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}
