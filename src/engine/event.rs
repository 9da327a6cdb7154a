//! Events that drive conversation transitions

use crate::content::QuizItem;

/// Slash commands the transport recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: the entry command, valid from every state
    Start,
    /// `/menu`: show the menu, and "back to menu" from the inner states
    Menu,
    Lesson,
    Quiz,
    Code,
    Info,
    /// `/cancel`: terminate the session, valid from every state
    Cancel,
}

/// Inputs to the transition function: classified user turns plus the
/// outcomes of collaborator calls requested by earlier effects
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    /// Free text, including reply-keyboard labels
    Text(String),

    // Collaborator outcomes, fed back by the runtime
    LessonFetched { number: u8, body: String },
    LessonMissing { number: u8 },
    QuizFetched(QuizItem),
    QuizUnavailable,
    /// Output of a code run; runner failures arrive as text here too
    CodeFinished { output: String },
}
