pub mod index;
pub mod loader;
pub mod path;
pub mod retrieval;

pub use loader::LessonLoader;

/// Lesson material assembled for a single request. Never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonContext {
    pub path: String,
    pub title: String,
    pub content: String,
    pub chapter_number: Option<u32>,
    pub lesson_number: Option<u32>,
}

impl LessonContext {
    /// `page` is the raw markdown the title comes from; `content` is what the
    /// model actually gets to read.
    pub fn new(url_path: &str, page: &str, content: String) -> Self {
        let (chapter_number, lesson_number) = path::extract_numbers(url_path);

        Self {
            path: url_path.to_string(),
            title: path::extract_title(page),
            content,
            chapter_number,
            lesson_number,
        }
    }
}
