#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use study_mode::{
    api::{router, state::AppState},
    config::{store::StudyModeConfig, structure::StudyModeConfigInner},
};
use tempfile::TempDir;

/// A small book: one part with a README and a chapter holding two lessons.
pub fn book() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "01-foundations/README.md", "# Foundations\n\nWhy agents, and why now.\n");
    write(
        root,
        "01-foundations/01-intro/README.md",
        "---\ntitle: Introduction\n---\n\nWhere the book begins.\n",
    );
    write(
        root,
        "01-foundations/01-intro/01-first-lesson.md",
        &format!(
            "---\ntitle: \"First Lesson\"\n---\n\n# First Lesson\n\n{}",
            "Agents plan, act and observe in a loop. ".repeat(40)
        ),
    );
    write(
        root,
        "01-foundations/01-intro/02-second-lesson.md",
        &format!("# Second Lesson\n\n{}", "Tools extend what an agent can do. ".repeat(40)),
    );
    std::fs::create_dir_all(root.join("02-advanced")).unwrap();

    dir
}

pub fn config(book: &Path, max_requests: u32) -> StudyModeConfig {
    let mut inner = StudyModeConfigInner::default();
    inner.content.base_path = book.to_path_buf();
    inner.rate_limit.max_requests = max_requests;
    inner.rate_limit.cleanup_interval_secs = 0;

    StudyModeConfig::in_memory(inner)
}

pub fn app(book: &Path, max_requests: u32) -> Router {
    router(AppState::new(config(book, max_requests)).unwrap())
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
