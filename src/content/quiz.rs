//! Quiz sets loaded from `quizzes/<lang>.json`

use super::ContentResult;
use crate::texts::Lang;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    /// Two or more choices; `answer` must equal one of them
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Filesystem-backed quiz sets
#[derive(Debug, Clone)]
pub struct FsQuizzes {
    dir: PathBuf,
}

impl FsQuizzes {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, lang: Lang) -> PathBuf {
        self.dir.join(format!("{}.json", lang.code()))
    }

    /// Full item list for a language. A missing file is an empty set, not
    /// an error; the engine renders "no quiz available" either way.
    pub async fn load(&self, lang: Lang) -> ContentResult<Vec<QuizItem>> {
        let path = self.path(lang);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "quiz file missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let items: Vec<QuizItem> = serde_json::from_str(&raw)?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_quiz_dir(items: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), items).unwrap();
        dir
    }

    #[tokio::test]
    async fn loads_items_with_optional_explanation() {
        let dir = write_quiz_dir(
            r#"[
                {
                    "question": "What does print do?",
                    "options": ["Writes to stdout", "Reads a file"],
                    "answer": "Writes to stdout",
                    "explanation": "print writes text to standard output."
                },
                {
                    "question": "2 + 2?",
                    "options": ["3", "4"],
                    "answer": "4"
                }
            ]"#,
        );

        let quizzes = FsQuizzes::new(dir.path());
        let items = quizzes.load(Lang::En).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].explanation.is_some());
        assert!(items[1].explanation.is_none());
        assert!(items[0].options.contains(&items[0].answer));
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let quizzes = FsQuizzes::new(dir.path());
        assert!(quizzes.load(Lang::Fr).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = write_quiz_dir("{ not json ]");
        let quizzes = FsQuizzes::new(dir.path());
        assert!(quizzes.load(Lang::En).await.is_err());
    }
}
