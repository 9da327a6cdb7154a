//! Session record and conversation state types

use crate::texts::{Lang, Score};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current node in the conversation graph.
///
/// The quiz-answer state carries the pending answer and explanation inside
/// the variant, so "a pending answer exists iff the session awaits a quiz
/// answer" cannot be violated by any transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Waiting for a language choice; also the node the entry command
    /// re-initializes to
    #[default]
    AwaitingLanguage,
    /// Main menu
    Menu,
    /// Lesson list shown, waiting for a lesson pick
    AwaitingLessonChoice,
    /// Quiz question shown, waiting for the answer text
    AwaitingQuizAnswer {
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    /// Quiz resolved, waiting for "another quiz" or anything else
    AwaitingQuizContinue,
    /// Code prompt shown, waiting for a submission
    AwaitingCode,
    /// Code result shown, waiting for "run more" or anything else
    AwaitingCodeContinue,
    /// Explicitly cancelled; only the entry command leaves this node
    Terminated,
}

impl ChatState {
    /// The correct answer of the currently shown quiz item, if any
    #[allow(dead_code)] // state query utility
    pub fn pending_answer(&self) -> Option<&str> {
        match self {
            ChatState::AwaitingQuizAnswer { answer, .. } => Some(answer),
            _ => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, ChatState::Terminated)
    }
}

/// Profile fields the transport captures from an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatProfile {
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// One per chat id; all mutable conversation state lives here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub lang: Lang,
    pub state: ChatState,
    pub correct_count: u32,
    pub total_count: u32,
    pub joined_at: DateTime<Utc>,
}

impl Session {
    /// Fresh record for a first contact, in the initial state with zeroed
    /// counters
    pub fn new(profile: ChatProfile, joined_at: DateTime<Utc>) -> Self {
        Self {
            chat_id: profile.chat_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            username: profile.username,
            lang: Lang::default(),
            state: ChatState::default(),
            correct_count: 0,
            total_count: 0,
            joined_at,
        }
    }

    /// Score snapshot, present only once at least one quiz was answered
    pub fn score(&self) -> Option<Score> {
        if self.total_count == 0 {
            None
        } else {
            Some(Score {
                correct: self.correct_count,
                total: self.total_count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_with_type_tag() {
        let json = serde_json::to_string(&ChatState::Menu).unwrap();
        assert_eq!(json, r#"{"type":"menu"}"#);

        let quiz = ChatState::AwaitingQuizAnswer {
            answer: "4".to_string(),
            explanation: None,
        };
        let json = serde_json::to_string(&quiz).unwrap();
        let back: ChatState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quiz);
        assert_eq!(back.pending_answer(), Some("4"));
    }

    #[test]
    fn default_state_round_trips() {
        let back: ChatState =
            serde_json::from_str(r#"{"type":"awaiting_language"}"#).unwrap();
        assert_eq!(back, ChatState::default());
    }

    #[test]
    fn score_absent_until_first_answer() {
        let mut session = Session::new(
            ChatProfile {
                chat_id: 7,
                first_name: "Ada".to_string(),
                last_name: String::new(),
                username: String::new(),
            },
            Utc::now(),
        );
        assert!(session.score().is_none());
        session.total_count = 2;
        session.correct_count = 1;
        let score = session.score().unwrap();
        assert_eq!((score.correct, score.total), (1, 2));
    }
}
