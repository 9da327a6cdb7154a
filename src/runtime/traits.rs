//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with fake implementations.

use crate::content::{ContentError, FsLessons, FsQuizzes, QuizItem};
use crate::engine::Session;
use crate::exec::PythonRunner;
use crate::store::{SessionDb, StoreError};
use crate::texts::Lang;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable per-chat session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: i64) -> Result<Option<Session>, StoreError>;

    async fn upsert(&self, session: &Session) -> Result<(), StoreError>;

    /// Every record, for the admin listing
    async fn all(&self) -> Result<Vec<Session>, StoreError>;
}

/// Read-only lesson and quiz content
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn lesson(&self, lang: Lang, number: u8) -> Result<Option<String>, ContentError>;

    async fn quiz_items(&self, lang: Lang) -> Result<Vec<QuizItem>, ContentError>;
}

/// Code execution collaborator. Infallible by contract: failures are
/// rendered as output text.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, source: &str) -> String;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, chat_id: i64) -> Result<Option<Session>, StoreError> {
        (**self).get(chat_id).await
    }

    async fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        (**self).upsert(session).await
    }

    async fn all(&self) -> Result<Vec<Session>, StoreError> {
        (**self).all().await
    }
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn lesson(&self, lang: Lang, number: u8) -> Result<Option<String>, ContentError> {
        (**self).lesson(lang, number).await
    }

    async fn quiz_items(&self, lang: Lang) -> Result<Vec<QuizItem>, ContentError> {
        (**self).quiz_items(lang).await
    }
}

#[async_trait]
impl<T: CodeRunner + ?Sized> CodeRunner for Arc<T> {
    async fn run(&self, source: &str) -> String {
        (**self).run(source).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl SessionStore for SessionDb {
    async fn get(&self, chat_id: i64) -> Result<Option<Session>, StoreError> {
        self.get_session(chat_id)
    }

    async fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        self.upsert_session(session)
    }

    async fn all(&self) -> Result<Vec<Session>, StoreError> {
        self.all_sessions()
    }
}

/// Filesystem content rooted at the content directory
#[derive(Debug, Clone)]
pub struct FsContent {
    lessons: FsLessons,
    quizzes: FsQuizzes,
}

impl FsContent {
    pub fn new(content_dir: impl Into<std::path::PathBuf>) -> Self {
        let dir = content_dir.into();
        Self {
            lessons: FsLessons::new(dir.join("lessons")),
            quizzes: FsQuizzes::new(dir.join("quizzes")),
        }
    }
}

#[async_trait]
impl ContentStore for FsContent {
    async fn lesson(&self, lang: Lang, number: u8) -> Result<Option<String>, ContentError> {
        self.lessons.load(lang, number).await
    }

    async fn quiz_items(&self, lang: Lang) -> Result<Vec<QuizItem>, ContentError> {
        self.quizzes.load(lang).await
    }
}

#[async_trait]
impl CodeRunner for PythonRunner {
    async fn run(&self, source: &str) -> String {
        PythonRunner::run(self, source).await
    }
}
