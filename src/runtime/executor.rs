//! Conversation runtime executor
//!
//! Drives the pure transition function: loads the session, applies the
//! event, executes effects in order, and feeds collaborator outcomes back
//! in as follow-up events until the turn settles. Content failures never
//! escape; they become the fallback events the engine already handles.

use super::traits::{CodeRunner, ContentStore, SessionStore};
use crate::engine::{transition, ChatProfile, Command, Effect, Event, Reply, Session};
use crate::store::StoreError;
use crate::texts::Lang;
use chrono::Utc;
use rand::seq::SliceRandom;
use thiserror::Error;

/// Errors that abort one turn of event handling
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session store failure: {0}")]
    Store(#[from] StoreError),
}

/// Executes conversations against the injected collaborators
pub struct TutorRuntime<S, C, R> {
    store: S,
    content: C,
    runner: R,
}

impl<S, C, R> TutorRuntime<S, C, R>
where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    pub fn new(store: S, content: C, runner: R) -> Self {
        Self {
            store,
            content,
            runner,
        }
    }

    /// Entry command: create or reset the record, greet with the language
    /// picker
    pub async fn start_session(&self, profile: ChatProfile) -> Result<Vec<Reply>, RuntimeError> {
        self.handle_event(profile, Event::Command(Command::Start))
            .await
    }

    /// One inbound event for one chat; returns the ordered replies
    pub async fn handle_event(
        &self,
        profile: ChatProfile,
        event: Event,
    ) -> Result<Vec<Reply>, RuntimeError> {
        let mut session = self.load_or_create(profile, &event).await?;
        let mut replies = Vec::new();

        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let result = transition(&session, event);
            session = result.session;
            for effect in result.effects {
                match effect {
                    Effect::Send(reply) => replies.push(reply),
                    Effect::Save => self.store.upsert(&session).await?,
                    Effect::FetchLesson { number } => {
                        pending = Some(self.fetch_lesson(session.lang, number).await);
                    }
                    Effect::FetchQuiz => {
                        pending = Some(self.fetch_quiz(session.lang).await);
                    }
                    Effect::RunCode { source } => {
                        let output = self.runner.run(&source).await;
                        pending = Some(Event::CodeFinished { output });
                    }
                }
            }
        }

        Ok(replies)
    }

    /// Every session record (admin listing)
    pub async fn sessions(&self) -> Result<Vec<Session>, RuntimeError> {
        Ok(self.store.all().await?)
    }

    /// Insert an externally provided record (admin `/add_user`)
    pub async fn register_session(&self, session: &Session) -> Result<(), RuntimeError> {
        Ok(self.store.upsert(session).await?)
    }

    async fn load_or_create(
        &self,
        profile: ChatProfile,
        event: &Event,
    ) -> Result<Session, RuntimeError> {
        match self.store.get(profile.chat_id).await? {
            Some(mut session) => {
                // The entry command refreshes the stored profile fields
                if *event == Event::Command(Command::Start) {
                    session.first_name = profile.first_name;
                    session.last_name = profile.last_name;
                    session.username = profile.username;
                }
                Ok(session)
            }
            None => {
                let session = Session::new(profile, Utc::now());
                tracing::info!(
                    chat_id = session.chat_id,
                    name = %session.first_name,
                    "new session"
                );
                self.store.upsert(&session).await?;
                Ok(session)
            }
        }
    }

    async fn fetch_lesson(&self, lang: Lang, number: u8) -> Event {
        match self.content.lesson(lang, number).await {
            Ok(Some(body)) => Event::LessonFetched { number, body },
            Ok(None) => Event::LessonMissing { number },
            Err(e) => {
                tracing::warn!(lang = lang.code(), number, error = %e, "lesson fetch failed");
                Event::LessonMissing { number }
            }
        }
    }

    async fn fetch_quiz(&self, lang: Lang) -> Event {
        let items = match self.content.quiz_items(lang).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(lang = lang.code(), error = %e, "quiz fetch failed");
                return Event::QuizUnavailable;
            }
        };
        match items.choose(&mut rand::thread_rng()) {
            Some(item) => Event::QuizFetched(item.clone()),
            None => Event::QuizUnavailable,
        }
    }
}
