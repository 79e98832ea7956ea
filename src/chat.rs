pub mod client;
pub mod error;
pub mod handler;
pub mod prompt;
pub mod types;

pub use error::{ChatError, ErrorCode};
pub use handler::ChatService;
pub use types::{ChatMessage, ChatMode, ChatRequest, ChatResponse, MessageRole, ResponseMetadata};
