//! Localized text table
//!
//! Every user-facing string lives here, keyed by message id and language.
//! Transition logic never embeds prose; it builds a [`Text`] and the
//! renderer localizes it. Keyboard labels and the marker substrings used by
//! input classification are defined alongside so they cannot drift apart.

use serde::{Deserialize, Serialize};

/// Interface language of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Fr,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Lang::En),
            "fr" => Some(Lang::Fr),
            _ => None,
        }
    }
}

/// Quiz score snapshot used wherever the score clause is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    /// Percentage of correct answers. Only meaningful when `total > 0`,
    /// which [`crate::engine::Session::score`] guarantees.
    pub fn percentage(self) -> f64 {
        f64::from(self.correct) * 100.0 / f64::from(self.total)
    }
}

// ============================================================================
// Marker substrings
// ============================================================================

/// Leading markers of the five menu options, in menu order
pub const MENU_MARKERS: [&str; 5] = ["📚", "❓", "💻", "ℹ️", "🔄"];

/// Markers of the "back to menu" button
pub const BACK_TO_MENU_MARKERS: [&str; 2] = ["Retour au Menu", "Back to Menu"];

/// Marker of the "back" row on the language picker
pub const LANGUAGE_BACK_MARKER: &str = "Retour / Back";

/// Markers of the "another quiz" button
pub const ANOTHER_QUIZ_MARKERS: [&str; 2] = ["Autre Quiz", "Another Quiz"];

/// Markers of the "run more code" / "try again" buttons
pub const RUN_MORE_MARKERS: [&str; 4] =
    ["Exécuter autre", "Run more", "Réessayer", "Try again"];

/// First line of a code submission relayed by the companion web form
pub const WEB_CODE_MARKER: &str = "Code reçu depuis l'interface web";

// ============================================================================
// Message table
// ============================================================================

/// A localizable message with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum Text<'a> {
    /// Greeting shown with the language picker on the entry command.
    /// Bilingual on purpose: no language is selected yet.
    ChooseLanguage { first_name: &'a str },
    /// Picker shown by the "change language" menu option
    ChangeLanguage,
    LanguageSet,
    MenuIntro {
        first_name: &'a str,
        score: Option<Score>,
    },
    UnrecognizedOption,
    SessionEnded,
    LessonList,
    UnrecognizedLesson,
    LessonUnderDevelopment { number: u8 },
    QuizQuestion { question: &'a str },
    QuizCorrect {
        score: Score,
        explanation: Option<&'a str>,
    },
    QuizWrong {
        answer: &'a str,
        score: Score,
        explanation: Option<&'a str>,
    },
    QuizUnavailable,
    CodePrompt,
    CodeResult { output: &'a str },
    InfoCard {
        chat_id: i64,
        first_name: &'a str,
        last_name: &'a str,
        joined: &'a str,
        score: Option<Score>,
    },
    InfoHint,
}

/// Render a message in the given language
pub fn localize(text: &Text<'_>, lang: Lang) -> String {
    match (text, lang) {
        (Text::ChooseLanguage { first_name }, _) => {
            format!("👋 Hello {first_name}! Choose language / Choisis ta langue :")
        }

        (Text::ChangeLanguage, Lang::Fr) => "Choisissez votre langue:".to_string(),
        (Text::ChangeLanguage, Lang::En) => "Choose your language:".to_string(),

        (Text::LanguageSet, Lang::Fr) => {
            "✅ Langue définie sur français. Tapez /menu pour continuer.".to_string()
        }
        (Text::LanguageSet, Lang::En) => {
            "✅ Language set to English. Type /menu to continue.".to_string()
        }

        (Text::MenuIntro { first_name, score }, Lang::Fr) => format!(
            "Bonjour {first_name}! Voici les options disponibles:{}",
            score_clause(*score, lang)
        ),
        (Text::MenuIntro { first_name, score }, Lang::En) => format!(
            "Hello {first_name}! Here are the available options:{}",
            score_clause(*score, lang)
        ),

        (Text::UnrecognizedOption, Lang::Fr) => {
            "Option non reconnue. Veuillez choisir une option du menu.".to_string()
        }
        (Text::UnrecognizedOption, Lang::En) => {
            "Unrecognized option. Please choose an option from the menu.".to_string()
        }

        (Text::SessionEnded, Lang::Fr) => {
            "Session terminée. Envoyez /start pour recommencer.".to_string()
        }
        (Text::SessionEnded, Lang::En) => {
            "Session ended. Send /start to begin again.".to_string()
        }

        (Text::LessonList, Lang::Fr) => "Choisissez une leçon:".to_string(),
        (Text::LessonList, Lang::En) => "Choose a lesson:".to_string(),

        (Text::UnrecognizedLesson, Lang::Fr) => {
            "Leçon non reconnue. Veuillez choisir une leçon disponible.".to_string()
        }
        (Text::UnrecognizedLesson, Lang::En) => {
            "Unrecognized lesson. Please choose an available lesson.".to_string()
        }

        (Text::LessonUnderDevelopment { number }, Lang::Fr) => {
            format!("Leçon {number} en cours de développement.\nRevenez bientôt!")
        }
        (Text::LessonUnderDevelopment { number }, Lang::En) => {
            format!("Lesson {number} under development.\nCheck back soon!")
        }

        (Text::QuizQuestion { question }, _) => format!("📝 Quiz: {question}"),

        (Text::QuizCorrect { score, explanation }, Lang::Fr) => format!(
            "✅ Bonne réponse ! ({}/{}){}",
            score.correct,
            score.total,
            explanation_clause(*explanation, lang)
        ),
        (Text::QuizCorrect { score, explanation }, Lang::En) => format!(
            "✅ Correct answer! ({}/{}){}",
            score.correct,
            score.total,
            explanation_clause(*explanation, lang)
        ),

        (Text::QuizWrong { answer, score, explanation }, Lang::Fr) => format!(
            "❌ Mauvaise réponse. La bonne réponse était: {answer} ({}/{}){}",
            score.correct,
            score.total,
            explanation_clause(*explanation, lang)
        ),
        (Text::QuizWrong { answer, score, explanation }, Lang::En) => format!(
            "❌ Wrong answer. The correct answer was: {answer} ({}/{}){}",
            score.correct,
            score.total,
            explanation_clause(*explanation, lang)
        ),

        (Text::QuizUnavailable, Lang::Fr) => {
            "Aucun quiz disponible pour le moment.".to_string()
        }
        (Text::QuizUnavailable, Lang::En) => {
            "No quiz available at the moment.".to_string()
        }

        (Text::CodePrompt, Lang::Fr) => {
            "💻 Envoyez-moi votre code Python et je l'exécuterai pour vous.\n\n\
             Exemple:\n```\nprint('Bonjour!')\nfor i in range(5):\n    print(i)\n```"
                .to_string()
        }
        (Text::CodePrompt, Lang::En) => {
            "💻 Send me your Python code and I'll execute it for you.\n\n\
             Example:\n```\nprint('Hello!')\nfor i in range(5):\n    print(i)\n```"
                .to_string()
        }

        (Text::CodeResult { output }, Lang::Fr) => {
            format!("✅ Résultat de l'exécution:\n\n```\n{output}\n```")
        }
        (Text::CodeResult { output }, Lang::En) => {
            format!("✅ Execution result:\n\n```\n{output}\n```")
        }

        (Text::InfoCard { chat_id, first_name, last_name, joined, score }, _) => format!(
            "🔑 ID: {chat_id}\n👤 First name: {first_name}\n👤 Last name: {last_name}\n\
             🌐 Language: {}\n📅 Joined: {joined}{}",
            lang.code(),
            stats_clause(*score, lang)
        ),

        (Text::InfoHint, Lang::Fr) => {
            "ℹ️ Utilisez le bouton ci-dessous pour revenir au menu principal.".to_string()
        }
        (Text::InfoHint, Lang::En) => {
            "ℹ️ Use the button below to return to the main menu.".to_string()
        }
    }
}

/// Menu score line, omitted entirely when no quiz has been answered
fn score_clause(score: Option<Score>, lang: Lang) -> String {
    match (score, lang) {
        (None, _) => String::new(),
        (Some(s), Lang::Fr) => format!(
            "\n📊 Score Quiz: {}/{} ({:.1}%)",
            s.correct,
            s.total,
            s.percentage()
        ),
        (Some(s), Lang::En) => format!(
            "\n📊 Quiz Score: {}/{} ({:.1}%)",
            s.correct,
            s.total,
            s.percentage()
        ),
    }
}

/// Info-card statistics lines, omitted when no quiz has been answered
fn stats_clause(score: Option<Score>, lang: Lang) -> String {
    match (score, lang) {
        (None, _) => String::new(),
        (Some(s), Lang::Fr) => format!(
            "\n📊 Quiz complétés: {}\n📈 Réponses correctes: {} ({:.1}%)",
            s.total,
            s.correct,
            s.percentage()
        ),
        (Some(s), Lang::En) => format!(
            "\n📊 Quizzes completed: {}\n📈 Correct answers: {} ({:.1}%)",
            s.total,
            s.correct,
            s.percentage()
        ),
    }
}

fn explanation_clause(explanation: Option<&str>, lang: Lang) -> String {
    match (explanation, lang) {
        (None, _) => String::new(),
        (Some(e), Lang::Fr) => format!("\n\nExplication: {e}"),
        (Some(e), Lang::En) => format!("\n\nExplanation: {e}"),
    }
}

// ============================================================================
// Keyboard labels
// ============================================================================

/// Number of published lessons per language
pub const LESSON_COUNT: u8 = 4;

/// Rows of the language picker, with the optional back row from the
/// "change language" flow
pub fn language_keyboard(with_back: bool) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "🇫🇷 Français (fr)".to_string(),
        "🇬🇧 English (en)".to_string(),
    ]];
    if with_back {
        rows.push(vec!["🔙 Retour / Back".to_string()]);
    }
    rows
}

/// The five menu options, one per row, in [`MENU_MARKERS`] order
pub fn menu_keyboard(lang: Lang) -> Vec<Vec<String>> {
    let labels: [&str; 5] = match lang {
        Lang::Fr => [
            "📚 Leçons - Apprenez Python pas à pas",
            "❓ Quiz - Testez vos connaissances",
            "💻 Code - Exécutez du code Python",
            "ℹ️ Info - Voir vos informations",
            "🔄 Langue - Changer de langue",
        ],
        Lang::En => [
            "📚 Lessons - Learn Python step by step",
            "❓ Quiz - Test your knowledge",
            "💻 Code - Execute Python code",
            "ℹ️ Info - View your information",
            "🔄 Language - Change language",
        ],
    };
    labels.iter().map(|l| vec![(*l).to_string()]).collect()
}

/// Localized label of one lesson button
pub fn lesson_label(lang: Lang, number: u8) -> String {
    let topic = match (lang, number) {
        (Lang::Fr, 1) => "Bases de Python",
        (Lang::Fr, 2) => "Variables et Types",
        (Lang::Fr, 3) => "Conditions",
        (Lang::Fr, _) => "Boucles",
        (Lang::En, 1) => "Python Basics",
        (Lang::En, 2) => "Variables and Types",
        (Lang::En, 3) => "Conditions",
        (Lang::En, _) => "Loops",
    };
    match lang {
        Lang::Fr => format!("📖 Leçon {number}: {topic}"),
        Lang::En => format!("📖 Lesson {number}: {topic}"),
    }
}

/// Lesson list keyboard: one lesson per row, back row last
pub fn lesson_keyboard(lang: Lang) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = (1..=LESSON_COUNT)
        .map(|n| vec![lesson_label(lang, n)])
        .collect();
    rows.push(vec![back_to_menu_label(lang)]);
    rows
}

pub fn back_to_menu_label(lang: Lang) -> String {
    match lang {
        Lang::Fr => "🔙 Retour au Menu".to_string(),
        Lang::En => "🔙 Back to Menu".to_string(),
    }
}

/// Single-row keyboard holding only the back-to-menu button
pub fn back_keyboard(lang: Lang) -> Vec<Vec<String>> {
    vec![vec![back_to_menu_label(lang)]]
}

/// Keyboard shown after a quiz resolution
pub fn quiz_continue_keyboard(lang: Lang) -> Vec<Vec<String>> {
    let another = match lang {
        Lang::Fr => "❓ Autre Quiz",
        Lang::En => "❓ Another Quiz",
    };
    vec![vec![another.to_string()], vec![back_to_menu_label(lang)]]
}

/// Keyboard shown after a code run
pub fn code_continue_keyboard(lang: Lang) -> Vec<Vec<String>> {
    let run_more = match lang {
        Lang::Fr => "🔄 Exécuter autre code",
        Lang::En => "🔄 Run more code",
    };
    vec![vec![run_more.to_string()], vec![back_to_menu_label(lang)]]
}
