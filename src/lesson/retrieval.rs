use super::{
    LessonContext, LessonLoader,
    index::KeywordIndex,
    loader::LocatedPage,
    path::{self, clip},
};
use crate::chat::ChatError;

impl LessonLoader {
    /// The keyword index over the whole book, built on first use.
    pub async fn keyword_index(&self) -> &KeywordIndex {
        self.index
            .get_or_init(|| KeywordIndex::build(self.root(), self.config.min_keyword_len))
            .await
    }

    /// Assembles context in four tiers, narrowest first: the current page,
    /// pages the message names, the chapter's summaries, then snippets from
    /// the rest of the book. The result is cut to the context budget, so the
    /// broad tiers are the first to go.
    pub async fn retrieve(
        &self,
        url_path: &str,
        user_message: &str,
    ) -> Result<LessonContext, ChatError> {
        let page = self.locate(url_path).await?;
        let budget = self.config.max_context_chars;

        let mut content = page.content.clone();

        let referenced = self.referenced_topics(&page, user_message).await;
        if !referenced.is_empty() {
            log::debug!("{url_path}: message references {} other page(s)", referenced.len());
            content.push_str("\n\n=== REFERENCED TOPICS ===\nLessons the student mentioned by name:\n");
            content.push_str(&referenced.join("\n"));
        }

        if content.chars().count() < budget {
            let summaries = match page.is_readme() {
                true => self.readme_context(&page).await,
                false => self.chapter_summaries(page.dir()).await,
            };
            content.push_str(&summaries);
        }

        if content.chars().count() < budget {
            content.push_str(&self.book_snippets(&page).await);
        }

        Ok(LessonContext::new(
            url_path,
            &page.content,
            path::truncate_content(&content, budget),
        ))
    }

    async fn referenced_topics(&self, page: &LocatedPage, user_message: &str) -> Vec<String> {
        let index = self.keyword_index().await;
        let mut sections = Vec::new();

        for entry in index
            .matches(user_message, &page.file)
            .into_iter()
            .take(self.config.max_referenced_pages)
        {
            let excerpt = self
                .lesson_excerpt(&entry.file, self.config.referenced_page_chars)
                .await;
            if !excerpt.is_empty() {
                sections.push(format!("\n--- {} ({}) ---\n{excerpt}", entry.title, entry.url_path));
            }
        }

        sections
    }

    /// The opening of each chapter README across the book, skipping the
    /// chapter the page already lives in.
    async fn book_snippets(&self, page: &LocatedPage) -> String {
        let mut snippets = Vec::new();

        for part in Self::numbered_dirs(&Self::list_dir(self.root()).await) {
            let part_dir = self.root().join(&part);

            for chapter in Self::numbered_dirs(&Self::list_dir(&part_dir).await) {
                let chapter_dir = part_dir.join(&chapter);
                if chapter_dir == page.dir() {
                    continue;
                }

                let mut readme = self
                    .lesson_excerpt(&chapter_dir.join("README.md"), self.config.snippet_chars)
                    .await;
                if readme.is_empty() {
                    readme = self
                        .lesson_excerpt(&chapter_dir.join("README.mdx"), self.config.snippet_chars)
                        .await;
                }
                if readme.trim().is_empty() {
                    continue;
                }

                snippets.push(format!(
                    "\n--- {} / {} ---\n{}",
                    path::numbered_label("Part", &part),
                    path::numbered_label("Chapter", &chapter),
                    clip(readme.trim(), self.config.snippet_chars, "..."),
                ));
            }
        }

        if snippets.is_empty() {
            return String::new();
        }

        format!(
            "\n\n=== BOOK OVERVIEW ===\nShort excerpts from the rest of the book:\n{}",
            snippets.join("\n")
        )
    }
}
