//! Lesson and quiz content providers
//!
//! Read-only content lives on the filesystem: lesson bodies as plain text,
//! quiz sets as one JSON file per language. The providers surface missing
//! lessons as `None` and broken quiz files as errors the engine recovers
//! from.

mod lessons;
mod quiz;

pub use lessons::FsLessons;
pub use quiz::{FsQuizzes, QuizItem};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("quiz file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ContentResult<T> = Result<T, ContentError>;
