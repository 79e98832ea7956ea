use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use tokio::sync::OnceCell;

use crate::{chat::ChatError, config::structure::ContentConfig};

use super::{
    LessonContext,
    index::KeywordIndex,
    path::{self, clip},
};

#[derive(Debug, Clone)]
pub(super) struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// A markdown file found for a lesson path, read in full.
#[derive(Debug, Clone)]
pub(super) struct LocatedPage {
    pub file: PathBuf,
    pub content: String,
}

impl LocatedPage {
    pub fn is_readme(&self) -> bool {
        self.file
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(path::is_readme)
    }

    pub fn dir(&self) -> &Path {
        self.file.parent().unwrap_or(Path::new(""))
    }
}

/// Reads lesson markdown out of a docs tree laid out as
/// `NN-part/NN-chapter/NN-lesson.md`, with optional `*.summary.md` files
/// beside each lesson.
pub struct LessonLoader {
    root: PathBuf,
    pub(super) config: ContentConfig,
    pub(super) index: OnceCell<KeywordIndex>,
}

impl LessonLoader {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            root: config.base_path.clone(),
            config,
            index: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Loads the page behind `url_path`. README pages also get the summaries
    /// beneath them, and near-empty pages get the whole book digest.
    pub async fn load(&self, url_path: &str) -> Result<LessonContext, ChatError> {
        let page = self.locate(url_path).await?;

        let mut additional = self.readme_context(&page).await;

        if path::visible_text_len(&page.content) < self.config.minimal_page_chars
            && additional.is_empty()
        {
            log::debug!("{url_path} is a minimal page, loading book digest");
            additional = self.book_digest().await;
        }

        let content = path::truncate_content(
            &format!("{}{additional}", page.content),
            self.config.max_context_chars,
        );

        Ok(LessonContext::new(url_path, &page.content, content))
    }

    /// True when the path names an existing directory in the content tree,
    /// such as a part or chapter index.
    pub async fn is_index_page(&self, url_path: &str) -> bool {
        let clean = path::clean_url_path(url_path);
        let Some(segments) = path::segments(&clean) else {
            return false;
        };

        let resolved = self.resolve(&segments).await;
        tokio::fs::metadata(self.root.join(resolved))
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    /// `Part N: Name` for each numbered top-level directory.
    pub async fn book_outline(&self) -> Vec<String> {
        Self::numbered_dirs(&Self::list_dir(&self.root).await)
            .iter()
            .map(|name| path::numbered_label("Part", name))
            .collect()
    }

    pub(super) async fn locate(&self, url_path: &str) -> Result<LocatedPage, ChatError> {
        let not_found = || ChatError::LessonNotFound(format!("Could not load content for: {url_path}"));

        let clean = path::clean_url_path(url_path);
        let segments = path::segments(&clean).ok_or_else(not_found)?;
        let resolved = self.resolve(&segments).await;

        for candidate in self.candidates(&resolved, &clean) {
            if let Ok(content) = tokio::fs::read_to_string(&candidate).await {
                log::debug!("{url_path} -> {}", candidate.display());
                return Ok(LocatedPage {
                    file: candidate,
                    content,
                });
            }
        }

        // any markdown file in the resolved directory will do
        let dir = self.root.join(&resolved);
        let fallback = Self::list_dir(&dir).await.into_iter().find(|entry| {
            !entry.is_dir && entry.name.ends_with(".md") && !path::is_summary(&entry.name)
        });

        if let Some(entry) = fallback {
            let file = dir.join(&entry.name);
            if let Ok(content) = tokio::fs::read_to_string(&file).await {
                log::debug!("{url_path} -> {} (directory fallback)", file.display());
                return Ok(LocatedPage { file, content });
            }
        }

        Err(not_found())
    }

    fn candidates(&self, resolved: &str, clean: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        let mut bases = vec![resolved];
        if clean != resolved {
            bases.push(clean);
        }

        for base in bases {
            candidates.push(self.root.join(format!("{base}.md")));
            candidates.push(self.root.join(format!("{base}.mdx")));
            for index in ["index.md", "index.mdx", "README.md", "README.mdx"] {
                candidates.push(self.root.join(base).join(index));
            }
        }

        let part = resolved.split('/').next().unwrap_or_default();
        candidates.push(self.root.join(part).join("README.md"));

        candidates
    }

    /// Maps each URL segment onto a real entry, tolerating the `NN-` prefixes
    /// the URLs leave out. Unmatched segments are kept verbatim.
    pub(super) async fn resolve(&self, segments: &[&str]) -> String {
        let mut current = self.root.clone();
        let mut resolved = Vec::with_capacity(segments.len());

        for segment in segments {
            let matched = Self::find_matching_entry(&current, segment)
                .await
                .unwrap_or_else(|| segment.to_string());

            current.push(&matched);
            resolved.push(matched);
        }

        resolved.join("/")
    }

    async fn find_matching_entry(dir: &Path, segment: &str) -> Option<String> {
        let entries = Self::list_dir(dir).await;

        if entries.iter().any(|entry| entry.name == segment) {
            return Some(segment.to_string());
        }

        let pattern = RegexBuilder::new(&format!(r"^\d+-{}$", regex::escape(segment)))
            .case_insensitive(true)
            .build()
            .ok()?;

        entries.into_iter().find_map(|entry| {
            if entry.is_dir {
                pattern.is_match(&entry.name).then_some(entry.name)
            } else if path::is_markdown(&entry.name) && !path::is_summary(&entry.name) {
                let stem = path::strip_markdown_ext(&entry.name);
                pattern.is_match(stem).then(|| stem.to_string())
            } else {
                None
            }
        })
    }

    /// Extra context for README pages: chapter summaries for a part, lesson
    /// summaries for a chapter. Empty for ordinary lessons.
    pub(super) async fn readme_context(&self, page: &LocatedPage) -> String {
        if !page.is_readme() {
            return String::new();
        }

        let dir = page.dir();
        let is_part = Self::list_dir(dir)
            .await
            .iter()
            .any(|entry| entry.is_dir && path::is_numbered(&entry.name));

        match is_part {
            true => self.part_chapter_summaries(dir).await,
            false => self.chapter_summaries(dir).await,
        }
    }

    pub(super) async fn chapter_summaries(&self, chapter_dir: &Path) -> String {
        let mut summaries = Vec::new();

        for entry in Self::list_dir(chapter_dir).await {
            if entry.is_dir || !entry.name.ends_with(".summary.md") {
                continue;
            }

            let Ok(content) = tokio::fs::read_to_string(chapter_dir.join(&entry.name)).await
            else {
                continue;
            };

            let label = match path::number_prefix(&entry.name) {
                Some((number, _)) => format!("Lesson {number}"),
                None => entry.name.trim_end_matches(".summary.md").to_string(),
            };
            summaries.push(format!("\n--- {label} Summary ---\n{content}"));
        }

        if summaries.is_empty() {
            return String::new();
        }

        format!(
            "\n\n=== CHAPTER LESSON SUMMARIES ===\nThe following summaries cover all lessons in this chapter:\n{}",
            summaries.join("\n")
        )
    }

    async fn part_chapter_summaries(&self, part_dir: &Path) -> String {
        let mut chapters = Vec::new();

        for chapter in Self::numbered_dirs(&Self::list_dir(part_dir).await) {
            let summaries = self.chapter_summaries(&part_dir.join(&chapter)).await;
            if !summaries.is_empty() {
                let label = path::numbered_label("Chapter", &chapter).to_uppercase();
                chapters.push(format!("\n=== {label} ===\n{summaries}"));
            }
        }

        if chapters.is_empty() {
            return String::new();
        }

        format!(
            "\n\n=== PART CONTENT SUMMARIES ===\nThe following summaries cover all chapters and lessons in this part:\n{}",
            chapters.join("\n")
        )
    }

    /// A lesson body without frontmatter, clipped to `max_chars`.
    pub(super) async fn lesson_excerpt(&self, file: &Path, max_chars: usize) -> String {
        match tokio::fs::read_to_string(file).await {
            Ok(content) => clip(path::strip_frontmatter(&content), max_chars, "\n[...truncated]"),
            Err(_) => String::new(),
        }
    }

    async fn chapter_full_content(&self, chapter_dir: &Path) -> String {
        let mut lessons = Vec::new();

        for entry in Self::list_dir(chapter_dir).await {
            let name = &entry.name;
            if entry.is_dir
                || !name.ends_with(".md")
                || path::is_summary(name)
                || path::is_readme(name)
            {
                continue;
            }

            let content = self
                .lesson_excerpt(&chapter_dir.join(name), self.config.digest_lesson_chars)
                .await;
            if content.is_empty() {
                continue;
            }

            let label = path::numbered_label("Lesson", path::strip_markdown_ext(name));
            lessons.push(format!("\n--- {label} ---\n{content}"));
        }

        lessons.join("\n")
    }

    async fn part_full_content(&self, part_dir: &Path) -> String {
        let mut chapters = Vec::new();

        for chapter in Self::numbered_dirs(&Self::list_dir(part_dir).await) {
            let content = self.chapter_full_content(&part_dir.join(&chapter)).await;
            if !content.is_empty() {
                let label = path::numbered_label("Chapter", &chapter).to_uppercase();
                chapters.push(format!("\n=== {label} ===\n{content}"));
            }
        }

        chapters.join("\n")
    }

    /// Every lesson of every part, each clipped. Used for pages too thin to
    /// teach from on their own.
    pub(super) async fn book_digest(&self) -> String {
        let mut parts = Vec::new();

        for part in Self::numbered_dirs(&Self::list_dir(&self.root).await) {
            let content = self.part_full_content(&self.root.join(&part)).await;
            if !content.is_empty() {
                let label = path::numbered_label("Part", &part).to_uppercase();
                parts.push(format!("\n\n========== {label} ==========\n{content}"));
            }
        }

        if parts.is_empty() {
            return String::new();
        }

        format!(
            "\n\n========== COMPLETE BOOK CONTENT ==========\nThe following content covers every part, chapter, and lesson in the book:\n{}",
            parts.join("\n")
        )
    }

    /// Directory entries sorted by name. Unreadable directories list as empty.
    pub(super) async fn list_dir(dir: &Path) -> Vec<DirEntryInfo> {
        let Ok(mut read_dir) = tokio::fs::read_dir(dir).await else {
            return vec![];
        };

        let mut entries = Vec::new();
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            let is_dir = tokio::fs::metadata(entry.path())
                .await
                .is_ok_and(|meta| meta.is_dir());

            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub(super) fn numbered_dirs(entries: &[DirEntryInfo]) -> Vec<String> {
        entries
            .iter()
            .filter(|entry| entry.is_dir && path::is_numbered(&entry.name))
            .map(|entry| entry.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::tests::{BookFixture, loader_for};

    #[tokio::test]
    async fn loads_lesson_by_exact_path() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let lesson = loader
            .load("/docs/01-foundations/01-agent-factory/01-inflection-point")
            .await
            .unwrap();

        assert_eq!(lesson.title, "The 2025 Inflection Point");
        assert_eq!(lesson.chapter_number, Some(1));
        assert_eq!(lesson.lesson_number, Some(1));
        assert!(lesson.content.contains("inflection"));
    }

    #[tokio::test]
    async fn resolves_numbered_prefixes() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let lesson = loader
            .load("/docs/foundations/agent-factory/inflection-point")
            .await
            .unwrap();

        assert_eq!(lesson.title, "The 2025 Inflection Point");
        assert_eq!(lesson.path, "/docs/foundations/agent-factory/inflection-point");
    }

    #[tokio::test]
    async fn prefix_matching_ignores_case() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let resolved = loader.resolve(&["Foundations", "Agent-Factory"]).await;

        assert_eq!(resolved, "01-foundations/01-agent-factory");
    }

    #[tokio::test]
    async fn chapter_readme_gets_lesson_summaries() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let lesson = loader.load("/docs/foundations/agent-factory").await.unwrap();

        assert_eq!(lesson.title, "Agent Factory Paradigm");
        assert!(lesson.content.contains("=== CHAPTER LESSON SUMMARIES ==="));
        assert!(lesson.content.contains("--- Lesson 1 Summary ---"));
        assert!(lesson.content.contains("--- Lesson 2 Summary ---"));
    }

    #[tokio::test]
    async fn part_readme_gets_chapter_summaries() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let lesson = loader.load("/docs/foundations").await.unwrap();

        assert!(lesson.content.contains("=== PART CONTENT SUMMARIES ==="));
        assert!(lesson.content.contains("=== CHAPTER 1: AGENT FACTORY ==="));
    }

    #[tokio::test]
    async fn minimal_page_gets_book_digest() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let lesson = loader.load("/docs/thesis").await.unwrap();

        assert_eq!(lesson.title, "Thesis");
        assert!(lesson.content.contains("========== COMPLETE BOOK CONTENT =========="));
        assert!(lesson.content.contains("========== PART 2: CUSTOM AGENTS =========="));
        assert!(lesson.content.contains("--- Lesson 1: inflection point ---"));
        assert!(!lesson.content.contains("Summary ---"));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let err = loader.load("/docs/nonexistent").await.unwrap_err();

        assert!(matches!(err, ChatError::LessonNotFound(_)));
        assert!(!loader.is_index_page("/docs/nonexistent").await);
    }

    #[tokio::test]
    async fn traversal_is_not_found() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let err = loader.load("/docs/../../etc/passwd").await.unwrap_err();

        assert!(matches!(err, ChatError::LessonNotFound(_)));
    }

    #[tokio::test]
    async fn empty_chapter_directory_is_an_index_page() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        let err = loader.load("/docs/custom-agents/empty-chapter").await.unwrap_err();

        assert!(matches!(err, ChatError::LessonNotFound(_)));
        assert!(loader.is_index_page("/docs/custom-agents/empty-chapter").await);
        assert!(loader.is_index_page("/docs").await);
    }

    #[tokio::test]
    async fn outlines_parts() {
        let book = BookFixture::new();
        let loader = loader_for(&book);

        assert_eq!(
            loader.book_outline().await,
            vec!["Part 1: foundations", "Part 2: custom agents"]
        );
    }

    #[tokio::test]
    async fn respects_context_budget() {
        let book = BookFixture::new();
        let mut config = book.config();
        config.max_context_chars = 200;
        let loader = LessonLoader::new(config);

        let lesson = loader.load("/docs/thesis").await.unwrap();

        assert!(lesson.content.ends_with(path::TRUNCATION_MARKER));
    }
}
