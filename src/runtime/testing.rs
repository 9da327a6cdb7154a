//! Fake implementations for testing
//!
//! These fakes enable integration testing of the executor without real I/O.

use super::traits::{CodeRunner, ContentStore, SessionStore};
use crate::content::{ContentError, QuizItem};
use crate::engine::Session;
use crate::store::StoreError;
use crate::texts::Lang;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// In-memory session store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one persisted record
    pub fn session(&self, chat_id: i64) -> Option<Session> {
        self.sessions.lock().unwrap().get(&chat_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, chat_id: i64) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(&chat_id).cloned())
    }

    async fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.chat_id, session.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions.lock().unwrap().values().cloned().collect())
    }
}

// ============================================================================
// Scripted content store
// ============================================================================

#[derive(Default)]
pub struct FakeContent {
    lessons: HashMap<(Lang, u8), String>,
    quizzes: HashMap<Lang, Vec<QuizItem>>,
    broken_quizzes: bool,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lesson(mut self, lang: Lang, number: u8, body: impl Into<String>) -> Self {
        self.lessons.insert((lang, number), body.into());
        self
    }

    pub fn with_quiz(mut self, lang: Lang, item: QuizItem) -> Self {
        self.quizzes.entry(lang).or_default().push(item);
        self
    }

    /// Simulate an unreadable quiz file
    pub fn with_broken_quizzes(mut self) -> Self {
        self.broken_quizzes = true;
        self
    }
}

#[async_trait]
impl ContentStore for FakeContent {
    async fn lesson(&self, lang: Lang, number: u8) -> Result<Option<String>, ContentError> {
        Ok(self.lessons.get(&(lang, number)).cloned())
    }

    async fn quiz_items(&self, lang: Lang) -> Result<Vec<QuizItem>, ContentError> {
        if self.broken_quizzes {
            return Err(ContentError::Io(std::io::Error::other("disk on fire")));
        }
        Ok(self.quizzes.get(&lang).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Scripted code runner
// ============================================================================

/// Echoes the submission back, or returns the scripted output
#[derive(Default)]
pub struct FakeRunner {
    output: Option<String>,
    /// Record of all submissions run
    pub submissions: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

#[async_trait]
impl CodeRunner for FakeRunner {
    async fn run(&self, source: &str) -> String {
        self.submissions.lock().unwrap().push(source.to_string());
        self.output
            .clone()
            .unwrap_or_else(|| format!("ran: {source}"))
    }
}

// ============================================================================
// Integration tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChatProfile, ChatState, Command, Event, Reply};
    use crate::runtime::TutorRuntime;
    use std::sync::Arc;

    type TestRuntime = TutorRuntime<Arc<MemoryStore>, FakeContent, Arc<FakeRunner>>;

    fn profile() -> ChatProfile {
        ChatProfile {
            chat_id: 42,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: "ada".to_string(),
        }
    }

    fn quiz_item() -> QuizItem {
        QuizItem {
            question: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            answer: "4".to_string(),
            explanation: Some("Basic arithmetic.".to_string()),
        }
    }

    /// Runtime over fakes, keeping handles to the store and runner so
    /// tests can inspect what was persisted and executed
    fn runtime(
        content: FakeContent,
        runner: FakeRunner,
    ) -> (TestRuntime, Arc<MemoryStore>, Arc<FakeRunner>) {
        let store = Arc::new(MemoryStore::new());
        let runner = Arc::new(runner);
        let rt = TutorRuntime::new(store.clone(), content, runner.clone());
        (rt, store, runner)
    }

    async fn send(rt: &TestRuntime, text: &str) -> Vec<Reply> {
        rt.handle_event(profile(), Event::Text(text.to_string()))
            .await
            .unwrap()
    }

    /// The whole happy path: start, pick English, request a quiz, answer
    /// correctly
    #[tokio::test]
    async fn full_quiz_scenario() {
        let (rt, store, _) = runtime(
            FakeContent::new().with_quiz(Lang::En, quiz_item()),
            FakeRunner::new(),
        );

        let replies = rt.start_session(profile()).await.unwrap();
        assert!(replies[0].text.contains("Choose language"));

        let replies = send(&rt, "en").await;
        assert!(replies.last().unwrap().text.starts_with("Hello Ada"));

        let replies = send(&rt, "❓ Quiz - Test your knowledge").await;
        assert!(replies[0].text.contains("2 + 2?"));

        let replies = send(&rt, "4").await;
        assert!(replies[0].text.contains("Correct answer! (1/1)"));

        let session = store.session(42).unwrap();
        assert_eq!(session.state, ChatState::AwaitingQuizContinue);
        assert_eq!(session.correct_count, 1);
        assert_eq!(session.total_count, 1);
        assert_eq!(session.state.pending_answer(), None);
    }

    /// Empty quiz set: menu unchanged, counters untouched, error surfaced
    #[tokio::test]
    async fn empty_quiz_set_recovers_to_menu() {
        let (rt, store, _) = runtime(FakeContent::new(), FakeRunner::new());
        rt.start_session(profile()).await.unwrap();
        send(&rt, "fr").await;

        let replies = send(&rt, "❓ Quiz - Testez vos connaissances").await;
        assert!(replies[0].text.contains("Aucun quiz disponible"));

        let session = store.session(42).unwrap();
        assert_eq!(session.state, ChatState::Menu);
        assert_eq!(session.total_count, 0);
    }

    /// An unreadable quiz file behaves like an empty set
    #[tokio::test]
    async fn broken_quiz_file_recovers_to_menu() {
        let (rt, store, _) =
            runtime(FakeContent::new().with_broken_quizzes(), FakeRunner::new());
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;

        let replies = send(&rt, "❓ Quiz - Test your knowledge").await;
        assert!(replies[0].text.contains("No quiz available"));
        assert_eq!(store.session(42).unwrap().state, ChatState::Menu);
    }

    /// Long lessons arrive chunked, with navigation on the last chunk only
    #[tokio::test]
    async fn long_lesson_is_chunked() {
        let body = "a".repeat(4100);
        let (rt, _, _) = runtime(
            FakeContent::new().with_lesson(Lang::En, 1, body.clone()),
            FakeRunner::new(),
        );
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;
        send(&rt, "📚 Lessons - Learn Python step by step").await;

        let replies = send(&rt, "📖 Lesson 1: Python Basics").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].options.is_none());
        assert!(replies[1].options.is_some());
        let joined: String = replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined, body);
    }

    /// A missing lesson renders the placeholder and stays in the list
    #[tokio::test]
    async fn missing_lesson_is_nonfatal() {
        let (rt, store, _) = runtime(FakeContent::new(), FakeRunner::new());
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;
        send(&rt, "📚 Lessons - Learn Python step by step").await;

        let replies = send(&rt, "📖 Lesson 3: Conditions").await;
        assert!(replies[0].text.contains("under development"));
        assert_eq!(
            store.session(42).unwrap().state,
            ChatState::AwaitingLessonChoice
        );
    }

    /// Code submissions reach the runner and the result advances the state
    #[tokio::test]
    async fn code_flow_reaches_runner() {
        let (rt, store, runner) = runtime(
            FakeContent::new(),
            FakeRunner::new().with_output("Erreur : division by zero"),
        );
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;
        send(&rt, "💻 Code - Execute Python code").await;

        let replies = send(&rt, "1/0").await;
        assert!(replies[0].text.contains("division by zero"));

        assert_eq!(runner.submissions.lock().unwrap().as_slice(), ["1/0"]);
        assert_eq!(
            store.session(42).unwrap().state,
            ChatState::AwaitingCodeContinue
        );
    }

    /// The web-form marker in the menu state runs code directly
    #[tokio::test]
    async fn web_code_runs_from_menu() {
        let (rt, store, runner) = runtime(FakeContent::new(), FakeRunner::new());
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;

        let replies =
            send(&rt, "Code reçu depuis l'interface web :\nprint('web')").await;
        assert!(replies[0].text.contains("ran: print('web')"));
        assert_eq!(
            runner.submissions.lock().unwrap().as_slice(),
            ["print('web')"]
        );
        assert_eq!(
            store.session(42).unwrap().state,
            ChatState::AwaitingCodeContinue
        );
    }

    /// Restarting mid-conversation resets the persisted counters
    #[tokio::test]
    async fn restart_resets_persisted_counters() {
        let (rt, store, _) = runtime(
            FakeContent::new().with_quiz(Lang::En, quiz_item()),
            FakeRunner::new(),
        );
        rt.start_session(profile()).await.unwrap();
        send(&rt, "en").await;
        send(&rt, "❓ Quiz - Test your knowledge").await;
        send(&rt, "3").await;

        assert_eq!(store.session(42).unwrap().total_count, 1);

        rt.handle_event(profile(), Event::Command(Command::Start))
            .await
            .unwrap();
        let session = store.session(42).unwrap();
        assert_eq!(session.total_count, 0);
        assert_eq!(session.state, ChatState::AwaitingLanguage);
    }

    /// First contact with plain text creates the record in the initial state
    #[tokio::test]
    async fn first_contact_creates_record() {
        let (rt, store, _) = runtime(FakeContent::new(), FakeRunner::new());
        let replies = send(&rt, "hello there").await;
        // Unrecognized in AwaitingLanguage: the picker is re-rendered
        assert!(replies[0].text.contains("Choose language"));
        let session = store.session(42).unwrap();
        assert_eq!(session.state, ChatState::AwaitingLanguage);
        assert_eq!(session.first_name, "Ada");
    }
}
