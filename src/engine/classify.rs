//! Input classification
//!
//! Reply-keyboard labels arrive as plain text, with leading icons and
//! emphasis the user did not type. Each option therefore has a designated
//! marker substring; a text classifies as an option only when it contains
//! the marker of exactly that one option. Everything else is `Other` and
//! handled by the current state's unrecognized-input rule.

use super::state::ChatState;
use crate::texts::{
    Lang, ANOTHER_QUIZ_MARKERS, BACK_TO_MENU_MARKERS, LANGUAGE_BACK_MARKER, LESSON_COUNT,
    MENU_MARKERS, RUN_MORE_MARKERS, WEB_CODE_MARKER,
};

/// The five menu options, in keyboard order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Lessons,
    Quiz,
    Code,
    Info,
    ChangeLanguage,
}

const MENU_CHOICES: [MenuChoice; 5] = [
    MenuChoice::Lessons,
    MenuChoice::Quiz,
    MenuChoice::Code,
    MenuChoice::Info,
    MenuChoice::ChangeLanguage,
];

/// What a raw text means in the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputClass {
    BackToMenu,
    Menu(MenuChoice),
    Language(Lang),
    /// The back row of the change-language picker
    LanguageBack,
    Lesson(u8),
    AnotherQuiz,
    RunMore,
    /// Code relayed by the companion web form, marker line stripped
    WebCode(String),
    Other,
}

/// Classify a text against the label set meaningful in `state`
pub fn classify(state: &ChatState, text: &str) -> InputClass {
    match state {
        ChatState::AwaitingLanguage => classify_language(text),
        ChatState::Menu => classify_menu(text),
        ChatState::AwaitingLessonChoice => classify_lesson(text),
        ChatState::AwaitingQuizAnswer { .. } | ChatState::AwaitingCode => {
            // Everything except the back button is the submission itself
            if is_back_to_menu(text) {
                InputClass::BackToMenu
            } else {
                InputClass::Other
            }
        }
        ChatState::AwaitingQuizContinue => {
            if contains_any(text, &ANOTHER_QUIZ_MARKERS) {
                InputClass::AnotherQuiz
            } else {
                InputClass::Other
            }
        }
        ChatState::AwaitingCodeContinue => {
            if contains_any(text, &RUN_MORE_MARKERS) {
                InputClass::RunMore
            } else {
                InputClass::Other
            }
        }
        ChatState::Terminated => InputClass::Other,
    }
}

fn classify_language(text: &str) -> InputClass {
    if text.contains(LANGUAGE_BACK_MARKER) {
        return InputClass::LanguageBack;
    }
    match language_choice(text) {
        Some(lang) => InputClass::Language(lang),
        None => InputClass::Other,
    }
}

/// Recognized language tokens: the bare code, the picker parenthetical, or
/// the language name. A text matching both languages is unrecognized.
pub fn language_choice(text: &str) -> Option<Lang> {
    let t = text.to_lowercase();
    let trimmed = t.trim();
    let fr = trimmed == "fr"
        || t.contains("(fr)")
        || t.contains("français")
        || t.contains("francais");
    let en = trimmed == "en" || t.contains("(en)") || t.contains("english");
    match (fr, en) {
        (true, false) => Some(Lang::Fr),
        (false, true) => Some(Lang::En),
        _ => None,
    }
}

fn classify_menu(text: &str) -> InputClass {
    if let Some(rest) = text.strip_prefix(WEB_CODE_MARKER) {
        // The marker line is followed by the code itself
        if let Some((_, code)) = rest.split_once('\n') {
            return InputClass::WebCode(code.to_string());
        }
        return InputClass::Other;
    }
    if is_back_to_menu(text) {
        return InputClass::BackToMenu;
    }
    let pairs: Vec<(MenuChoice, &str)> =
        MENU_CHOICES.iter().copied().zip(MENU_MARKERS).collect();
    match unique_match(text, &pairs) {
        Some(choice) => InputClass::Menu(choice),
        None => InputClass::Other,
    }
}

fn classify_lesson(text: &str) -> InputClass {
    if is_back_to_menu(text) {
        return InputClass::BackToMenu;
    }
    // Match either language's label fragment so a stale keyboard from
    // before a language switch still selects the intended lesson
    let mut pairs: Vec<(u8, String)> = Vec::new();
    for n in 1..=LESSON_COUNT {
        pairs.push((n, format!("Lesson {n}")));
        pairs.push((n, format!("Leçon {n}")));
    }
    let borrowed: Vec<(u8, &str)> =
        pairs.iter().map(|(n, m)| (*n, m.as_str())).collect();
    match unique_match(text, &borrowed) {
        Some(number) => InputClass::Lesson(number),
        None => InputClass::Other,
    }
}

pub fn is_back_to_menu(text: &str) -> bool {
    contains_any(text, &BACK_TO_MENU_MARKERS)
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// The option whose marker the text contains, provided exactly one option
/// matches. Two markers mapping to the same option count once.
fn unique_match<T: Copy + PartialEq>(text: &str, pairs: &[(T, &str)]) -> Option<T> {
    let mut hit: Option<T> = None;
    for (value, marker) in pairs {
        if text.contains(marker) {
            match hit {
                None => hit = Some(*value),
                Some(prev) if prev == *value => {}
                Some(_) => return None,
            }
        }
    }
    hit
}
