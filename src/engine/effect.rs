//! Effects produced by state transitions

/// An outbound message: body text plus optional reply-keyboard rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub options: Option<Vec<Vec<String>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: None,
        }
    }

    pub fn with_options(text: impl Into<String>, options: Vec<Vec<String>>) -> Self {
        Self {
            text: text.into(),
            options: Some(options),
        }
    }
}

/// Effects to be executed by the runtime after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a message to the chat
    Send(Reply),
    /// Persist the session record
    Save,
    /// Look up a lesson body for the session language; resolves to
    /// `LessonFetched` or `LessonMissing`
    FetchLesson { number: u8 },
    /// Draw a random quiz item for the session language; resolves to
    /// `QuizFetched` or `QuizUnavailable`
    FetchQuiz,
    /// Run a code submission; resolves to `CodeFinished`
    RunCode { source: String },
}
