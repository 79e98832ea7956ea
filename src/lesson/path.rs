use std::sync::LazyLock;

use regex::Regex;

use crate::utils::misc::humanize_slug;

static FRONTMATTER_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\A---[ \t]*\r?\n.*?title:[ \t]*["']?([^"'\r\n]+)["']?[ \t]*\r?\n.*?---"#)
        .expect("valid frontmatter regex")
});
static FIRST_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*$").expect("valid heading regex"));
static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---.*?---\n*").expect("valid frontmatter regex"));
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(.+)$").expect("valid prefix regex"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static EXPRESSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid expression regex"));

pub const UNTITLED: &str = "Untitled Lesson";
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated for length]";

/// `/docs/01-foundations/03-principles/` -> `01-foundations/03-principles`
pub fn clean_url_path(url_path: &str) -> String {
    let trimmed = url_path.trim();
    let without_docs = ["/docs", "docs"]
        .into_iter()
        .find_map(|prefix| {
            let rest = trimmed.strip_prefix(prefix)?;
            (rest.is_empty() || rest.starts_with('/')).then_some(rest)
        })
        .unwrap_or(trimmed);

    without_docs.trim_matches('/').to_string()
}

/// Splits a cleaned path into its segments, refusing anything that could
/// step outside the content root.
pub fn segments(clean_path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = clean_path.split('/').filter(|s| !s.is_empty()).collect();

    segments
        .iter()
        .all(|s| *s != "." && *s != ".." && !s.contains('\\'))
        .then_some(segments)
}

pub fn extract_title(content: &str) -> String {
    if let Some(captures) = FRONTMATTER_TITLE.captures(content) {
        return captures[1].trim().to_string();
    }

    if let Some(captures) = FIRST_HEADING.captures(content) {
        return captures[1].trim().to_string();
    }

    UNTITLED.to_string()
}

/// Chapter and lesson numbers taken from the numeric prefixes in a path.
///
/// With two or more numbered segments the last two are chapter and lesson;
/// a single one is the lesson.
pub fn extract_numbers(url_path: &str) -> (Option<u32>, Option<u32>) {
    let numbers: Vec<u32> = url_path
        .split('/')
        .filter_map(|segment| number_prefix(segment).map(|(n, _)| n))
        .collect();

    match numbers.as_slice() {
        [.., chapter, lesson] => (Some(*chapter), Some(*lesson)),
        [lesson] => (None, Some(*lesson)),
        [] => (None, None),
    }
}

pub fn number_prefix(name: &str) -> Option<(u32, &str)> {
    let captures = NUMBER_PREFIX.captures(name)?;
    let number = captures.get(1)?.as_str().parse().ok()?;
    let rest = captures.get(2)?.as_str();

    Some((number, rest))
}

pub fn is_numbered(name: &str) -> bool {
    number_prefix(name).is_some()
}

/// `05-agents-as-tools` -> `Chapter 5: agents as tools`
pub fn numbered_label(kind: &str, name: &str) -> String {
    match number_prefix(name) {
        Some((number, rest)) => format!("{kind} {number}: {}", humanize_slug(rest)),
        None => name.to_string(),
    }
}

/// Drops the numeric prefix and markdown extension from a file or directory name.
pub fn slug(name: &str) -> &str {
    let stem = strip_markdown_ext(name);
    number_prefix(stem).map(|(_, rest)| rest).unwrap_or(stem)
}

pub fn strip_markdown_ext(name: &str) -> &str {
    name.strip_suffix(".mdx")
        .or_else(|| name.strip_suffix(".md"))
        .unwrap_or(name)
}

pub fn is_markdown(name: &str) -> bool {
    name.ends_with(".md") || name.ends_with(".mdx")
}

pub fn is_summary(name: &str) -> bool {
    name.contains(".summary.")
}

pub fn is_readme(name: &str) -> bool {
    matches!(name, "README.md" | "README.mdx")
}

pub fn strip_frontmatter(content: &str) -> &str {
    match FRONTMATTER.find(content) {
        Some(found) => &content[found.end()..],
        None => content,
    }
}

/// Length of what a reader would see once JSX tags and expressions are gone.
pub fn visible_text_len(content: &str) -> usize {
    let without_tags = TAGS.replace_all(content, "");
    let without_expressions = EXPRESSIONS.replace_all(&without_tags, "");

    without_expressions.trim().chars().count()
}

/// Byte offset of the `max_chars`-th character, if the text is longer than that.
fn char_boundary(content: &str, max_chars: usize) -> Option<usize> {
    content.char_indices().nth(max_chars).map(|(i, _)| i)
}

/// Cuts to a hard character limit with a short marker.
pub fn clip(content: &str, max_chars: usize, marker: &str) -> String {
    match char_boundary(content, max_chars) {
        Some(end) => format!("{}{marker}", &content[..end]),
        None => content.to_string(),
    }
}

/// Cuts content down to `max_chars`, preferring a paragraph break when one
/// sits in the last fifth of the budget.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    let Some(end) = char_boundary(content, max_chars) else {
        return content.to_string();
    };

    let truncated = &content[..end];
    let cut = match truncated.rfind("\n\n") {
        Some(paragraph) if truncated[..paragraph].chars().count() * 5 > max_chars * 4 => {
            &truncated[..paragraph]
        }
        _ => truncated,
    };

    format!("{cut}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_docs_prefix_and_slashes() {
        assert_eq!(
            clean_url_path("/docs/01-foundations/03-principles/"),
            "01-foundations/03-principles"
        );
        assert_eq!(clean_url_path("docs/agents"), "agents");
        assert_eq!(clean_url_path("/docs"), "");
        assert_eq!(clean_url_path("/docsfoo/bar"), "docsfoo/bar");
        assert_eq!(clean_url_path("Coding-for-Problem-Solving/README"), "Coding-for-Problem-Solving/README");
    }

    #[test]
    fn rejects_traversal() {
        assert!(segments("01-foundations/../secrets").is_none());
        assert!(segments("a\\b").is_none());
        assert_eq!(segments("a//b").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn title_prefers_frontmatter() {
        let content = "---\nsidebar_position: 1\ntitle: \"Agents as Tools\"\n---\n\n# Something else\n";
        assert_eq!(extract_title(content), "Agents as Tools");
    }

    #[test]
    fn title_falls_back_to_heading_then_default() {
        assert_eq!(extract_title("intro\n\n# The Inflection Point\n"), "The Inflection Point");
        assert_eq!(extract_title("no headings here"), UNTITLED);
    }

    #[test]
    fn numbers_from_path() {
        assert_eq!(
            extract_numbers("/docs/01-foundations/03-principles/01-intro"),
            (Some(3), Some(1))
        );
        assert_eq!(extract_numbers("/docs/05-agents"), (None, Some(5)));
        assert_eq!(extract_numbers("/docs/agents/intro"), (None, None));
    }

    #[test]
    fn labels_and_slugs() {
        assert_eq!(numbered_label("Chapter", "05-agents-as-tools"), "Chapter 5: agents as tools");
        assert_eq!(numbered_label("Part", "appendix"), "appendix");
        assert_eq!(slug("03-agents-as-tools.md"), "agents-as-tools");
        assert_eq!(slug("README.mdx"), "README");
    }

    #[test]
    fn strips_frontmatter() {
        assert_eq!(strip_frontmatter("---\ntitle: x\n---\n\nbody"), "body");
        assert_eq!(strip_frontmatter("body"), "body");
    }

    #[test]
    fn visible_length_ignores_markup() {
        assert_eq!(visible_text_len("<Tabs>{props.value}</Tabs> hi "), 2);
    }

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("short", 100), "short");
    }

    #[test]
    fn truncates_at_late_paragraph_break() {
        let content = format!("{}\n\n{}", "a".repeat(90), "b".repeat(50));
        let truncated = truncate_content(&content, 100);

        assert_eq!(truncated, format!("{}{TRUNCATION_MARKER}", "a".repeat(90)));
    }

    #[test]
    fn hard_cut_when_break_is_early() {
        let content = format!("{}\n\n{}", "a".repeat(10), "b".repeat(200));
        let truncated = truncate_content(&content, 100);

        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncated.chars().count(), 100 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let content = "é".repeat(20);
        let truncated = truncate_content(&content, 5);

        assert!(truncated.starts_with("ééééé\n"));
    }
}
