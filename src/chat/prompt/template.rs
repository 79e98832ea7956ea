use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(book|title|path|slug|content)\}").expect("valid placeholder regex")
});

/// Values for the `{placeholder}`s a prompt template may use.
///
/// Substitution is a single pass over the template, so braces inside a
/// substituted value (a lesson body, or a path taken from the request) are
/// never read as placeholders.
pub struct TemplateVariables<'a> {
    book: &'a str,
    title: &'a str,
    path: &'a str,
    slug: &'a str,
    content: &'a str,
}

impl<'a> TemplateVariables<'a> {
    pub fn new(
        book: &'a str,
        title: &'a str,
        path: &'a str,
        slug: &'a str,
        content: &'a str,
    ) -> Self {
        Self {
            book,
            title,
            path,
            slug,
            content,
        }
    }

    pub fn substitute_template(&self, s: &str) -> String {
        PLACEHOLDER
            .replace_all(s, |caps: &Captures| match &caps[1] {
                "book" => self.book,
                "title" => self.title,
                "path" => self.path,
                "slug" => self.slug,
                _ => self.content,
            })
            .into_owned()
    }
}
