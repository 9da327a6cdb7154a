//! Property-based tests for the state machine
//!
//! These verify the session invariants hold across all possible inputs.

use super::classify::is_back_to_menu;
use super::event::{Command, Event};
use super::state::{ChatProfile, ChatState, Session};
use super::transition::{chunk_message, transition, MAX_MESSAGE_LEN};
use crate::content::QuizItem;
use crate::texts::Lang;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_lang() -> impl Strategy<Value = Lang> {
    prop_oneof![Just(Lang::En), Just(Lang::Fr)]
}

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::AwaitingLanguage),
        Just(ChatState::Menu),
        Just(ChatState::AwaitingLessonChoice),
        ("[a-zA-Z0-9 ]{1,12}", proptest::option::of("[a-zA-Z ]{1,30}")).prop_map(
            |(answer, explanation)| ChatState::AwaitingQuizAnswer {
                answer,
                explanation,
            }
        ),
        Just(ChatState::AwaitingQuizContinue),
        Just(ChatState::AwaitingCode),
        Just(ChatState::AwaitingCodeContinue),
        Just(ChatState::Terminated),
    ]
}

fn arb_session() -> impl Strategy<Value = Session> {
    (arb_state(), arb_lang(), 0u32..40, "[a-zA-Z]{1,10}")
        .prop_flat_map(|(state, lang, total, first_name)| {
            (0..=total).prop_map(move |correct| Session {
                chat_id: 42,
                first_name: first_name.clone(),
                last_name: String::new(),
                username: String::new(),
                lang,
                state: state.clone(),
                correct_count: correct,
                total_count: total,
                joined_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            })
        })
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start),
        Just(Command::Menu),
        Just(Command::Lesson),
        Just(Command::Quiz),
        Just(Command::Code),
        Just(Command::Info),
        Just(Command::Cancel),
    ]
}

fn arb_quiz_item() -> impl Strategy<Value = QuizItem> {
    (
        "[a-zA-Z ?]{1,30}",
        proptest::collection::vec("[a-zA-Z0-9]{1,8}", 2..5),
        proptest::option::of("[a-zA-Z ]{1,30}"),
    )
        .prop_map(|(question, options, explanation)| QuizItem {
            answer: options[0].clone(),
            question,
            options,
            explanation,
        })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_command().prop_map(Event::Command),
        "[a-zA-Z0-9éç🔙 ]{0,30}".prop_map(Event::Text),
        ("[a-zA-Z \n]{0,200}", 1u8..5).prop_map(|(body, number)| Event::LessonFetched {
            number,
            body
        }),
        (1u8..5).prop_map(|number| Event::LessonMissing { number }),
        arb_quiz_item().prop_map(Event::QuizFetched),
        Just(Event::QuizUnavailable),
        "[a-zA-Z0-9 \n]{0,60}".prop_map(|output| Event::CodeFinished { output }),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    /// correct_count never exceeds total_count
    #[test]
    fn counters_stay_consistent(session in arb_session(), event in arb_event()) {
        let result = transition(&session, event);
        prop_assert!(result.session.correct_count <= result.session.total_count);
    }

    /// Counters only ever decrease via the entry command
    #[test]
    fn counters_monotone_outside_restart(session in arb_session(), event in arb_event()) {
        let is_restart = event == Event::Command(Command::Start);
        let result = transition(&session, event);
        if is_restart {
            prop_assert_eq!(result.session.correct_count, 0);
            prop_assert_eq!(result.session.total_count, 0);
        } else {
            prop_assert!(result.session.correct_count >= session.correct_count);
            prop_assert!(result.session.total_count >= session.total_count);
        }
    }

    /// Exactly one total_count increment per quiz submission, none otherwise
    #[test]
    fn one_increment_per_submission(session in arb_session(), event in arb_event()) {
        let is_submission = matches!(
            (&session.state, &event),
            (ChatState::AwaitingQuizAnswer { .. }, Event::Text(t)) if !is_back_to_menu(t)
        );
        let is_restart = event == Event::Command(Command::Start);
        let result = transition(&session, event);
        if is_submission {
            prop_assert_eq!(result.session.total_count, session.total_count + 1);
        } else if !is_restart {
            prop_assert_eq!(result.session.total_count, session.total_count);
        }
    }

    /// The entry command is idempotent from every state
    #[test]
    fn entry_command_always_reinitializes(session in arb_session()) {
        let result = transition(&session, Event::Command(Command::Start));
        prop_assert_eq!(result.session.state, ChatState::AwaitingLanguage);
        prop_assert_eq!(result.session.correct_count, 0);
        prop_assert_eq!(result.session.total_count, 0);
    }

    /// The cancel command terminates from every state
    #[test]
    fn cancel_always_terminates(session in arb_session()) {
        let result = transition(&session, Event::Command(Command::Cancel));
        prop_assert!(result.session.state.is_terminated());
    }

    /// A pending answer can only be armed by an arriving quiz item
    #[test]
    fn pending_answer_only_from_quiz_fetch(session in arb_session(), event in arb_event()) {
        let was_armed = session.state.pending_answer().is_some();
        let is_fetch = matches!(event, Event::QuizFetched(_));
        let result = transition(&session, event);
        if result.session.state.pending_answer().is_some() {
            prop_assert!(is_fetch || was_armed);
        }
    }

    /// Terminated absorbs everything except the entry command
    #[test]
    fn terminated_is_absorbing(session in arb_session(), event in arb_event()) {
        let mut session = session;
        session.state = ChatState::Terminated;
        let is_restart = event == Event::Command(Command::Start);
        let result = transition(&session, event);
        if is_restart {
            prop_assert_eq!(result.session.state, ChatState::AwaitingLanguage);
        } else {
            prop_assert!(result.session.state.is_terminated());
        }
    }

    /// Chunks respect the cap and concatenate back to the input
    #[test]
    fn chunking_round_trips(body in "\\PC{0,9000}") {
        let chunks = chunk_message(&body);
        prop_assert!(!chunks.is_empty());
        for chunk in &chunks {
            prop_assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
        }
        prop_assert_eq!(chunks.concat(), body);
    }

    /// Profile fields survive every transition untouched
    #[test]
    fn profile_is_immutable(session in arb_session(), event in arb_event()) {
        let result = transition(&session, event);
        prop_assert_eq!(result.session.chat_id, session.chat_id);
        prop_assert_eq!(result.session.first_name, session.first_name);
        prop_assert_eq!(result.session.joined_at, session.joined_at);
    }
}

#[test]
fn fresh_session_starts_in_language_state() {
    let session = Session::new(
        ChatProfile {
            chat_id: 1,
            first_name: "Ada".to_string(),
            last_name: String::new(),
            username: String::new(),
        },
        Utc::now(),
    );
    assert_eq!(session.state, ChatState::AwaitingLanguage);
    assert_eq!(session.state.pending_answer(), None);
}
