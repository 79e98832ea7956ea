use serde::{Deserialize, Serialize};

use super::{
    prompt::{ASK_TEMPLATE, GUIDANCE_TEMPLATE, SystemPrompt, TEACH_TEMPLATE},
    template::TemplateVariables,
};
use crate::{chat::ChatMode, lesson::LessonContext};

/// Prompt settings from the `[config.prompt]` table. Every template is
/// optional; the built-in one is used when it is unset.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct SystemPromptBuilder {
    pub book: String,
    pub teach: Option<String>,
    pub ask: Option<String>,
    /// Uses `{book}` and `{outline}`.
    pub guidance: Option<String>,
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self {
            book: "AgentFactory".to_string(),
            teach: None,
            ask: None,
            guidance: None,
        }
    }
}

impl SystemPromptBuilder {
    pub fn template(&self, mode: ChatMode) -> &str {
        match mode {
            ChatMode::Teach => self.teach.as_deref().unwrap_or(TEACH_TEMPLATE),
            ChatMode::Ask => self.ask.as_deref().unwrap_or(ASK_TEMPLATE),
        }
    }

    pub fn build(&self, mode: ChatMode, lesson: &LessonContext) -> SystemPrompt {
        let slug = lesson
            .path
            .split('/')
            .filter(|part| !part.is_empty())
            .next_back()
            .unwrap_or("current-lesson");

        let variables = TemplateVariables::new(
            &self.book,
            &lesson.title,
            &lesson.path,
            slug,
            &lesson.content,
        );

        SystemPrompt::new(variables.substitute_template(self.template(mode)))
    }

    /// Context for a request that landed on an index page instead of a
    /// lesson.
    pub fn guidance(&self, outline: &[String]) -> String {
        let outline = match outline.is_empty() {
            true => "- See the sidebar for the full table of contents".to_string(),
            false => outline
                .iter()
                .map(|part| format!("- {part}"))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        self.guidance
            .as_deref()
            .unwrap_or(GUIDANCE_TEMPLATE)
            .replace("{book}", &self.book)
            .replace("{outline}", &outline)
    }

    pub fn guidance_title(&self) -> String {
        format!("{} Book", self.book)
    }
}
