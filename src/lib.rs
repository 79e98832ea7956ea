//! Study mode: a chat API that tutors readers of a markdown book.
//!
//! A request names the page the reader is on. The page is resolved on disk,
//! enriched with surrounding material from the book, and handed to a
//! language model behind a teach or ask prompt.

pub mod api;
pub mod chat;
pub mod config;
pub mod lesson;
pub mod limiter;
pub mod utils;
