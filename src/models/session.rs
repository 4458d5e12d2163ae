use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{InputMode, SessionStatus};
use super::triage_result::TriageResult;

/// One entry in a session's append-only answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// One triage conversation.
///
/// The classifier category is never stored: it is re-derived from
/// `input_mode`, `symptoms_text` and `observations` on every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub input_mode: InputMode,
    pub symptoms_text: String,
    pub severity: Option<String>,
    pub duration: Option<String>,
    pub observations: BTreeSet<String>,
    pub pending_question: Option<String>,
    pub answers: Vec<AnswerRecord>,
    pub status: SessionStatus,
    pub final_result: Option<TriageResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(input_mode: InputMode) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            input_mode,
            symptoms_text: String::new(),
            severity: None,
            duration: None,
            observations: BTreeSet::new(),
            pending_question: None,
            answers: Vec::new(),
            status: SessionStatus::Active,
            final_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status == SessionStatus::Finalized
    }

    /// Append narrative text, separated from earlier entries by a newline.
    pub fn append_symptoms(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.symptoms_text.is_empty() {
            self.symptoms_text.push('\n');
        }
        self.symptoms_text.push_str(text);
    }

    /// Merge image-derived tags. Tags are trimmed and lower-cased; the set dedups.
    pub fn add_observations<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim().to_lowercase();
            if !tag.is_empty() {
                self.observations.insert(tag);
            }
        }
    }

    /// Last-write-wins update of the optional qualifiers. Blank values are ignored.
    pub fn set_qualifiers(&mut self, severity: Option<&str>, duration: Option<&str>) {
        if let Some(s) = severity.map(str::trim).filter(|s| !s.is_empty()) {
            self.severity = Some(s.to_string());
        }
        if let Some(d) = duration.map(str::trim).filter(|d| !d.is_empty()) {
            self.duration = Some(d.to_string());
        }
    }

    pub fn has_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }

    pub fn record_answer(&mut self, question_id: &str, answer: &str) {
        self.answers.push(AnswerRecord {
            question_id: question_id.to_string(),
            answer: answer.trim().to_string(),
            answered_at: Utc::now(),
        });
    }

    pub fn finalize(&mut self, result: TriageResult) {
        self.status = SessionStatus::Finalized;
        self.pending_question = None;
        self.final_result = Some(result);
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active_with_fresh_id() {
        let a = Session::new(InputMode::Text);
        let b = Session::new(InputMode::Text);
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, SessionStatus::Active);
        assert!(a.pending_question.is_none());
    }

    #[test]
    fn symptoms_are_append_only() {
        let mut s = Session::new(InputMode::Text);
        s.append_symptoms("headache");
        s.append_symptoms("   ");
        s.append_symptoms("now nausea too");
        assert_eq!(s.symptoms_text, "headache\nnow nausea too");
    }

    #[test]
    fn observations_deduplicate_case_insensitively() {
        let mut s = Session::new(InputMode::Image);
        s.add_observations(["Redness", "redness ", "rash"]);
        assert_eq!(s.observations.len(), 2);
        assert!(s.observations.contains("redness"));
    }

    #[test]
    fn qualifiers_last_write_wins() {
        let mut s = Session::new(InputMode::Text);
        s.set_qualifiers(Some("mild"), Some("1 day"));
        s.set_qualifiers(None, Some("3 days"));
        s.set_qualifiers(Some(""), None);
        assert_eq!(s.severity.as_deref(), Some("mild"));
        assert_eq!(s.duration.as_deref(), Some("3 days"));
    }
}
