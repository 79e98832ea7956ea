pub mod agent;
pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod providers;

pub use agent::{CompletionAgent, CompletionRequest};
pub use providers::{CompletionModel, ModelRequest, Provider, ProviderClient, ProviderResponse};
