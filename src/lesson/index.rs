use std::path::{Path, PathBuf};

use super::{LessonLoader, path};
use crate::utils::misc::humanize_slug;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub file: PathBuf,
    pub url_path: String,
    pub title: String,
    pub keywords: Vec<String>,
}

/// Lesson titles and slug phrases for every page in the book, used to spot
/// topics a student names in their message.
#[derive(Debug, Default)]
pub struct KeywordIndex {
    entries: Vec<IndexEntry>,
}

impl KeywordIndex {
    pub async fn build(root: &Path, min_keyword_len: usize) -> Self {
        let mut entries = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in LessonLoader::list_dir(&dir).await {
                let file = dir.join(&entry.name);

                if entry.is_dir {
                    pending.push(file);
                    continue;
                }

                if !path::is_markdown(&entry.name) || path::is_summary(&entry.name) {
                    continue;
                }

                let Ok(content) = tokio::fs::read_to_string(&file).await else {
                    continue;
                };

                if let Some(indexed) = Self::entry(root, file, &content, min_keyword_len) {
                    entries.push(indexed);
                }
            }
        }

        entries.sort_by(|a, b| a.file.cmp(&b.file));
        log::info!("indexed {} lesson pages under {}", entries.len(), root.display());

        Self { entries }
    }

    fn entry(
        root: &Path,
        file: PathBuf,
        content: &str,
        min_keyword_len: usize,
    ) -> Option<IndexEntry> {
        let relative = file.strip_prefix(root).ok()?;
        let mut slugs: Vec<String> = relative
            .iter()
            .map(|part| path::slug(&part.to_string_lossy()).to_string())
            .collect();

        // a README stands for its directory
        if slugs.last().is_some_and(|last| last == "README" || last == "index") {
            slugs.pop();
        }

        let topic = slugs.last()?.clone();
        let title = path::extract_title(content);

        let mut keywords = vec![normalize(&humanize_slug(&topic))];
        if title != path::UNTITLED {
            keywords.push(normalize(&title));
        }
        keywords.retain(|keyword| keyword.chars().count() >= min_keyword_len);
        keywords.dedup();

        if keywords.is_empty() {
            return None;
        }

        Some(IndexEntry {
            url_path: format!("/docs/{}", slugs.join("/")),
            file,
            title,
            keywords,
        })
    }

    /// Entries whose keywords appear in `message`, longest match first.
    pub fn matches(&self, message: &str, exclude: &Path) -> Vec<&IndexEntry> {
        let normalized = normalize(message);

        let mut hits: Vec<(usize, &IndexEntry)> = self
            .entries
            .iter()
            .filter(|entry| entry.file != exclude)
            .filter_map(|entry| {
                entry
                    .keywords
                    .iter()
                    .filter(|keyword| normalized.contains(keyword.as_str()))
                    .map(|keyword| keyword.chars().count())
                    .max()
                    .map(|score| (score, entry))
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0));
        hits.into_iter().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase with hyphens read as spaces, applied to keywords and messages alike.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace('-', " ")
}
