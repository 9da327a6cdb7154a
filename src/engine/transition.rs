//! Pure state transition function
//!
//! Given the same session and event, `transition` always produces the same
//! updated session and effects, with no I/O. Collaborator calls (lesson
//! lookup, quiz draw, code run) are requested as effects; the runtime
//! executes them and feeds the outcome back in as the next event.

use super::classify::{classify, InputClass, MenuChoice};
use super::effect::{Effect, Reply};
use super::event::{Command, Event};
use super::state::{ChatState, Session};
use crate::content::QuizItem;
use crate::texts::{
    self, back_keyboard, code_continue_keyboard, language_keyboard, lesson_keyboard,
    menu_keyboard, quiz_continue_keyboard, Score, Text,
};

/// Hard cap on one outbound message; longer lesson bodies are chunked
pub(crate) const MAX_MESSAGE_LEN: usize = 4000;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_reply(self, reply: Reply) -> Self {
        self.with_effect(Effect::Send(reply))
    }
}

/// Pure transition function
pub fn transition(session: &Session, event: Event) -> TransitionResult {
    match event {
        // The entry and cancel commands are recognized from every state
        Event::Command(Command::Start) => restart(session),
        Event::Command(Command::Cancel) => terminate(session),
        Event::Command(cmd) => handle_command(session, cmd),
        Event::Text(text) => handle_text(session, &text),

        // Collaborator outcomes
        Event::LessonFetched { number: _, body } => lesson_fetched(session, &body),
        Event::LessonMissing { number } => lesson_missing(session, number),
        Event::QuizFetched(item) => quiz_fetched(session, item),
        Event::QuizUnavailable => quiz_unavailable(session),
        Event::CodeFinished { output } => code_finished(session, &output),
    }
}

// ============================================================================
// Commands
// ============================================================================

/// `/start`: re-enter the initial state with zeroed counters, from anywhere
fn restart(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::AwaitingLanguage;
    s.correct_count = 0;
    s.total_count = 0;
    let greeting = texts::localize(
        &Text::ChooseLanguage {
            first_name: &s.first_name,
        },
        s.lang,
    );
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(greeting, language_keyboard(false)))
}

/// `/cancel`: always available, always terminal
fn terminate(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::Terminated;
    let farewell = texts::localize(&Text::SessionEnded, s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::text(farewell))
}

fn handle_command(session: &Session, cmd: Command) -> TransitionResult {
    match (&session.state, cmd) {
        (ChatState::Terminated, _) => session_ended_hint(session),
        (ChatState::AwaitingLanguage, _) => reprompt_language(session),
        // `/menu` doubles as "back to menu" in every inner state
        (_, Command::Menu) => go_menu(session),
        (ChatState::Menu, Command::Lesson) => open_lessons(session),
        (ChatState::Menu, Command::Quiz) => request_quiz(session),
        (ChatState::Menu, Command::Code) => open_code(session),
        (ChatState::Menu, Command::Info) => show_info(session),
        // Menu-only commands elsewhere: say so, stay put
        _ => {
            let error = texts::localize(&Text::UnrecognizedOption, session.lang);
            TransitionResult::new(session.clone()).with_reply(Reply::text(error))
        }
    }
}

// ============================================================================
// Text inputs
// ============================================================================

fn handle_text(session: &Session, text: &str) -> TransitionResult {
    if session.state.is_terminated() {
        return session_ended_hint(session);
    }
    match classify(&session.state, text) {
        InputClass::Language(lang) => set_language(session, lang),
        InputClass::LanguageBack | InputClass::BackToMenu => go_menu(session),
        InputClass::Menu(choice) => menu_choice(session, choice),
        InputClass::Lesson(number) => {
            TransitionResult::new(session.clone()).with_effect(Effect::FetchLesson { number })
        }
        InputClass::AnotherQuiz => request_quiz(session),
        InputClass::RunMore => open_code(session),
        InputClass::WebCode(source) => run_code(session, source),
        InputClass::Other => other_text(session, text),
    }
}

/// Unclassified text, interpreted by the current state
fn other_text(session: &Session, text: &str) -> TransitionResult {
    match &session.state {
        ChatState::AwaitingLanguage => reprompt_language(session),
        ChatState::AwaitingLessonChoice => unrecognized_lesson(session),
        ChatState::AwaitingQuizAnswer { answer, explanation } => {
            grade(session, text, answer, explanation.clone())
        }
        ChatState::AwaitingCode => run_code(session, text.to_string()),
        // Anything but the continue button falls back to the menu
        ChatState::AwaitingQuizContinue | ChatState::AwaitingCodeContinue => go_menu(session),
        ChatState::Menu => unrecognized(session),
        ChatState::Terminated => session_ended_hint(session),
    }
}

fn menu_choice(session: &Session, choice: MenuChoice) -> TransitionResult {
    match choice {
        MenuChoice::Lessons => open_lessons(session),
        MenuChoice::Quiz => request_quiz(session),
        MenuChoice::Code => open_code(session),
        MenuChoice::Info => show_info(session),
        MenuChoice::ChangeLanguage => change_language(session),
    }
}

// ============================================================================
// Menu and navigation
// ============================================================================

fn menu_reply(session: &Session) -> Reply {
    let intro = texts::localize(
        &Text::MenuIntro {
            first_name: &session.first_name,
            score: session.score(),
        },
        session.lang,
    );
    Reply::with_options(intro, menu_keyboard(session.lang))
}

fn go_menu(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::Menu;
    let reply = menu_reply(&s);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(reply)
}

fn unrecognized(session: &Session) -> TransitionResult {
    let error = texts::localize(&Text::UnrecognizedOption, session.lang);
    let menu = menu_reply(session);
    TransitionResult::new(session.clone())
        .with_reply(Reply::text(error))
        .with_reply(menu)
}

fn session_ended_hint(session: &Session) -> TransitionResult {
    let hint = texts::localize(&Text::SessionEnded, session.lang);
    TransitionResult::new(session.clone()).with_reply(Reply::text(hint))
}

// ============================================================================
// Language
// ============================================================================

fn reprompt_language(session: &Session) -> TransitionResult {
    let greeting = texts::localize(
        &Text::ChooseLanguage {
            first_name: &session.first_name,
        },
        session.lang,
    );
    TransitionResult::new(session.clone())
        .with_reply(Reply::with_options(greeting, language_keyboard(false)))
}

/// The "change language" menu option keeps the score; only `/start` resets
fn change_language(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::AwaitingLanguage;
    let prompt = texts::localize(&Text::ChangeLanguage, s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(prompt, language_keyboard(true)))
}

fn set_language(session: &Session, lang: crate::texts::Lang) -> TransitionResult {
    let mut s = session.clone();
    s.lang = lang;
    s.state = ChatState::Menu;
    let confirmation = texts::localize(&Text::LanguageSet, lang);
    let menu = menu_reply(&s);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::text(confirmation))
        .with_reply(menu)
}

// ============================================================================
// Lessons
// ============================================================================

fn open_lessons(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::AwaitingLessonChoice;
    let prompt = texts::localize(&Text::LessonList, s.lang);
    let keyboard = lesson_keyboard(s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(prompt, keyboard))
}

fn unrecognized_lesson(session: &Session) -> TransitionResult {
    let error = texts::localize(&Text::UnrecognizedLesson, session.lang);
    let prompt = texts::localize(&Text::LessonList, session.lang);
    TransitionResult::new(session.clone())
        .with_reply(Reply::text(error))
        .with_reply(Reply::with_options(prompt, lesson_keyboard(session.lang)))
}

/// Deliver a lesson body in order, chunked to the message cap; only the
/// final chunk carries the navigation control
fn lesson_fetched(session: &Session, body: &str) -> TransitionResult {
    if session.state != ChatState::AwaitingLessonChoice {
        return TransitionResult::new(session.clone());
    }
    let mut result = TransitionResult::new(session.clone());
    let mut chunks = chunk_message(body);
    let last = chunks.pop().unwrap_or_default();
    for chunk in chunks {
        result = result.with_reply(Reply::text(chunk));
    }
    result.with_reply(Reply::with_options(last, back_keyboard(session.lang)))
}

fn lesson_missing(session: &Session, number: u8) -> TransitionResult {
    if session.state != ChatState::AwaitingLessonChoice {
        return TransitionResult::new(session.clone());
    }
    let body = texts::localize(&Text::LessonUnderDevelopment { number }, session.lang);
    TransitionResult::new(session.clone())
        .with_reply(Reply::with_options(body, back_keyboard(session.lang)))
}

/// Split into consecutive chunks of at most [`MAX_MESSAGE_LEN`] characters;
/// concatenating the chunks reproduces the input exactly
pub(crate) fn chunk_message(body: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;
    for ch in body.chars() {
        if len == MAX_MESSAGE_LEN {
            chunks.push(std::mem::take(&mut current));
            len = 0;
        }
        current.push(ch);
        len += 1;
    }
    chunks.push(current);
    chunks
}

// ============================================================================
// Quiz
// ============================================================================

/// Ask the runtime for a quiz item; the state advances only once one
/// arrives, so the pending answer is never set without a question out
fn request_quiz(session: &Session) -> TransitionResult {
    TransitionResult::new(session.clone()).with_effect(Effect::FetchQuiz)
}

fn quiz_fetched(session: &Session, item: QuizItem) -> TransitionResult {
    if !matches!(
        session.state,
        ChatState::Menu | ChatState::AwaitingQuizContinue
    ) {
        return TransitionResult::new(session.clone());
    }
    let mut s = session.clone();
    let question = texts::localize(
        &Text::QuizQuestion {
            question: &item.question,
        },
        s.lang,
    );
    let mut keyboard: Vec<Vec<String>> =
        item.options.iter().map(|o| vec![o.clone()]).collect();
    keyboard.push(vec![texts::back_to_menu_label(s.lang)]);
    s.state = ChatState::AwaitingQuizAnswer {
        answer: item.answer,
        explanation: item.explanation,
    };
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(question, keyboard))
}

fn quiz_unavailable(session: &Session) -> TransitionResult {
    if !matches!(
        session.state,
        ChatState::Menu | ChatState::AwaitingQuizContinue
    ) {
        return TransitionResult::new(session.clone());
    }
    let mut s = session.clone();
    s.state = ChatState::Menu;
    let error = texts::localize(&Text::QuizUnavailable, s.lang);
    let menu = menu_reply(&s);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::text(error))
        .with_reply(menu)
}

/// Exactly one `total_count` increment per submission, right or wrong;
/// leaving the quiz-answer state clears the pending answer
fn grade(
    session: &Session,
    text: &str,
    answer: &str,
    explanation: Option<String>,
) -> TransitionResult {
    let mut s = session.clone();
    s.total_count += 1;
    let correct = text == answer;
    if correct {
        s.correct_count += 1;
    }
    let score = Score {
        correct: s.correct_count,
        total: s.total_count,
    };
    let verdict = if correct {
        texts::localize(
            &Text::QuizCorrect {
                score,
                explanation: explanation.as_deref(),
            },
            s.lang,
        )
    } else {
        texts::localize(
            &Text::QuizWrong {
                answer,
                score,
                explanation: explanation.as_deref(),
            },
            s.lang,
        )
    };
    s.state = ChatState::AwaitingQuizContinue;
    let keyboard = quiz_continue_keyboard(s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(verdict, keyboard))
}

// ============================================================================
// Code execution
// ============================================================================

fn open_code(session: &Session) -> TransitionResult {
    let mut s = session.clone();
    s.state = ChatState::AwaitingCode;
    let prompt = texts::localize(&Text::CodePrompt, s.lang);
    let keyboard = back_keyboard(s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(prompt, keyboard))
}

fn run_code(session: &Session, source: String) -> TransitionResult {
    TransitionResult::new(session.clone()).with_effect(Effect::RunCode { source })
}

/// Runner failures arrive here as text, so a broken submission reads as a
/// result and never wedges the conversation
fn code_finished(session: &Session, output: &str) -> TransitionResult {
    if !matches!(session.state, ChatState::Menu | ChatState::AwaitingCode) {
        return TransitionResult::new(session.clone());
    }
    let mut s = session.clone();
    s.state = ChatState::AwaitingCodeContinue;
    let body = texts::localize(&Text::CodeResult { output }, s.lang);
    let keyboard = code_continue_keyboard(s.lang);
    TransitionResult::new(s)
        .with_effect(Effect::Save)
        .with_reply(Reply::with_options(body, keyboard))
}

// ============================================================================
// Info
// ============================================================================

fn show_info(session: &Session) -> TransitionResult {
    let joined = session.joined_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let card = texts::localize(
        &Text::InfoCard {
            chat_id: session.chat_id,
            first_name: &session.first_name,
            last_name: &session.last_name,
            joined: &joined,
            score: session.score(),
        },
        session.lang,
    );
    let hint = texts::localize(&Text::InfoHint, session.lang);
    TransitionResult::new(session.clone())
        .with_reply(Reply::text(card))
        .with_reply(Reply::with_options(hint, back_keyboard(session.lang)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::ChatProfile;
    use crate::texts::Lang;
    use chrono::Utc;

    fn test_session(state: ChatState) -> Session {
        let mut s = Session::new(
            ChatProfile {
                chat_id: 42,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                username: "ada".to_string(),
            },
            Utc::now(),
        );
        s.state = state;
        s
    }

    fn replies(result: &TransitionResult) -> Vec<&Reply> {
        result
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn entry_command_resets_counters_from_any_state() {
        let mut s = test_session(ChatState::AwaitingQuizContinue);
        s.correct_count = 3;
        s.total_count = 5;
        let result = transition(&s, Event::Command(Command::Start));
        assert_eq!(result.session.state, ChatState::AwaitingLanguage);
        assert_eq!(result.session.correct_count, 0);
        assert_eq!(result.session.total_count, 0);
        assert!(result.effects.contains(&Effect::Save));
    }

    #[test]
    fn language_choice_round_trips_into_localized_menu() {
        let s = test_session(ChatState::AwaitingLanguage);
        let result = transition(&s, Event::Text("🇫🇷 Français (fr)".to_string()));
        assert_eq!(result.session.lang, Lang::Fr);
        assert_eq!(result.session.state, ChatState::Menu);
        let sent = replies(&result);
        assert!(sent.last().unwrap().text.starts_with("Bonjour"));

        let result = transition(&s, Event::Text("en".to_string()));
        assert_eq!(result.session.lang, Lang::En);
        assert!(replies(&result).last().unwrap().text.starts_with("Hello"));
    }

    #[test]
    fn unrecognized_language_reprompts_without_mutation() {
        let s = test_session(ChatState::AwaitingLanguage);
        let result = transition(&s, Event::Text("klingon".to_string()));
        assert_eq!(result.session, s);
        assert!(!result.effects.contains(&Effect::Save));
        assert_eq!(replies(&result).len(), 1);
    }

    #[test]
    fn menu_quiz_label_requests_a_quiz_item() {
        let s = test_session(ChatState::Menu);
        let result = transition(&s, Event::Text("❓ Quiz - Test your knowledge".to_string()));
        assert_eq!(result.session.state, ChatState::Menu);
        assert_eq!(result.effects, vec![Effect::FetchQuiz]);
    }

    #[test]
    fn quiz_item_arms_the_pending_answer() {
        let s = test_session(ChatState::Menu);
        let item = QuizItem {
            question: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            answer: "4".to_string(),
            explanation: Some("Basic arithmetic.".to_string()),
        };
        let result = transition(&s, Event::QuizFetched(item));
        assert_eq!(result.session.state.pending_answer(), Some("4"));
        let sent = replies(&result);
        assert_eq!(sent.len(), 1);
        let options = sent[0].options.as_ref().unwrap();
        // Two choices plus the back row
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn correct_answer_scores_and_clears_pending() {
        let s = test_session(ChatState::AwaitingQuizAnswer {
            answer: "4".to_string(),
            explanation: Some("Basic arithmetic.".to_string()),
        });
        let result = transition(&s, Event::Text("4".to_string()));
        assert_eq!(result.session.state, ChatState::AwaitingQuizContinue);
        assert_eq!(result.session.correct_count, 1);
        assert_eq!(result.session.total_count, 1);
        assert_eq!(result.session.state.pending_answer(), None);
        let sent = replies(&result);
        assert!(sent[0].text.contains("Correct answer"));
        assert!(sent[0].text.contains("Explanation: Basic arithmetic."));
    }

    #[test]
    fn wrong_answer_counts_and_reveals_the_answer() {
        let s = test_session(ChatState::AwaitingQuizAnswer {
            answer: "4".to_string(),
            explanation: None,
        });
        let result = transition(&s, Event::Text("3".to_string()));
        assert_eq!(result.session.correct_count, 0);
        assert_eq!(result.session.total_count, 1);
        assert!(replies(&result)[0].text.contains("The correct answer was: 4"));
    }

    #[test]
    fn back_button_leaves_quiz_without_counting() {
        let s = test_session(ChatState::AwaitingQuizAnswer {
            answer: "4".to_string(),
            explanation: None,
        });
        let result = transition(&s, Event::Text("🔙 Back to Menu".to_string()));
        assert_eq!(result.session.state, ChatState::Menu);
        assert_eq!(result.session.total_count, 0);
    }

    #[test]
    fn empty_quiz_set_falls_back_to_menu() {
        let s = test_session(ChatState::Menu);
        let result = transition(&s, Event::QuizUnavailable);
        assert_eq!(result.session.state, ChatState::Menu);
        assert_eq!(result.session.total_count, 0);
        let sent = replies(&result);
        assert!(sent[0].text.contains("No quiz available"));
    }

    #[test]
    fn code_submission_runs_and_result_advances() {
        let s = test_session(ChatState::AwaitingCode);
        let result = transition(&s, Event::Text("print('hi')".to_string()));
        assert_eq!(
            result.effects,
            vec![Effect::RunCode {
                source: "print('hi')".to_string()
            }]
        );

        let result = transition(
            &s,
            Event::CodeFinished {
                output: "Erreur : division by zero".to_string(),
            },
        );
        assert_eq!(result.session.state, ChatState::AwaitingCodeContinue);
        assert!(replies(&result)[0].text.contains("division by zero"));
    }

    #[test]
    fn web_code_in_menu_runs_like_a_submission() {
        let s = test_session(ChatState::Menu);
        let result = transition(
            &s,
            Event::Text("Code reçu depuis l'interface web :\nprint(1)".to_string()),
        );
        assert_eq!(
            result.effects,
            vec![Effect::RunCode {
                source: "print(1)".to_string()
            }]
        );
    }

    #[test]
    fn cancel_terminates_and_only_start_revives() {
        let s = test_session(ChatState::Menu);
        let result = transition(&s, Event::Command(Command::Cancel));
        assert_eq!(result.session.state, ChatState::Terminated);

        let terminated = result.session;
        let stuck = transition(&terminated, Event::Text("quiz".to_string()));
        assert_eq!(stuck.session.state, ChatState::Terminated);
        assert!(replies(&stuck)[0].text.contains("/start"));

        let revived = transition(&terminated, Event::Command(Command::Start));
        assert_eq!(revived.session.state, ChatState::AwaitingLanguage);
    }

    #[test]
    fn lesson_chunks_cap_round_trip_and_keyboard_on_last_only() {
        let body: String = "é".repeat(9001);
        let chunks = chunk_message(&body);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_LEN));
        assert_eq!(chunks.concat(), body);

        let s = test_session(ChatState::AwaitingLessonChoice);
        let result = transition(
            &s,
            Event::LessonFetched {
                number: 1,
                body: body.clone(),
            },
        );
        let sent = replies(&result);
        assert_eq!(sent.len(), 3);
        assert!(sent[0].options.is_none());
        assert!(sent[1].options.is_none());
        assert!(sent[2].options.is_some());
        let joined: String = sent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined, body);
    }

    #[test]
    fn short_lesson_is_one_message_with_navigation() {
        let s = test_session(ChatState::AwaitingLessonChoice);
        let result = transition(
            &s,
            Event::LessonFetched {
                number: 2,
                body: "Variables hold values.".to_string(),
            },
        );
        let sent = replies(&result);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].options.is_some());
    }

    #[test]
    fn missing_lesson_renders_placeholder_and_stays() {
        let s = test_session(ChatState::AwaitingLessonChoice);
        let result = transition(&s, Event::LessonMissing { number: 3 });
        assert_eq!(result.session.state, ChatState::AwaitingLessonChoice);
        assert!(replies(&result)[0].text.contains("under development"));
    }

    #[test]
    fn unrecognized_menu_text_reprompts_menu() {
        let s = test_session(ChatState::Menu);
        let result = transition(&s, Event::Text("??".to_string()));
        assert_eq!(result.session.state, ChatState::Menu);
        let sent = replies(&result);
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.contains("Unrecognized option"));
    }

    #[test]
    fn change_language_keeps_the_score() {
        let mut s = test_session(ChatState::Menu);
        s.correct_count = 2;
        s.total_count = 3;
        let result = transition(&s, Event::Text("🔄 Language - Change language".to_string()));
        assert_eq!(result.session.state, ChatState::AwaitingLanguage);
        assert_eq!(result.session.correct_count, 2);
        assert_eq!(result.session.total_count, 3);
    }

    #[test]
    fn stale_content_event_is_ignored() {
        let s = test_session(ChatState::Menu);
        let result = transition(
            &s,
            Event::LessonFetched {
                number: 1,
                body: "late".to_string(),
            },
        );
        assert_eq!(result.session, s);
        assert!(result.effects.is_empty());
    }
}
