use serde::Serialize;

/// A follow-up question from the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub options: &'static [&'static str],
    pub allow_custom_answer: bool,
}

impl Question {
    /// Whether `answer` is one of the predefined options (case-insensitive).
    pub fn is_option(&self, answer: &str) -> bool {
        let answer = answer.trim();
        self.options.iter().any(|o| o.eq_ignore_ascii_case(answer))
    }
}
