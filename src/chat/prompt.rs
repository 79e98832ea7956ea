pub mod builder;
pub mod prompt;
pub mod template;

pub use builder::SystemPromptBuilder;
pub use prompt::SystemPrompt;
pub use template::TemplateVariables;
