//! Question router: picks the next follow-up question for a session, or
//! signals that the caller asked to finalize.
//!
//! Routing is a pure function of (session snapshot, category, trigger).
//! The category is always freshly classified by the caller.

use serde::Serialize;

use crate::models::{Category, Question, Session};

use super::questions::{QuestionCatalog, CONTINUE_QUESTION_ID, FINALIZE_OPTION};

/// Router lifecycle state, derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterState {
    /// No question outstanding.
    New,
    AwaitingAnswer,
    Finalized,
}

impl RouterState {
    pub fn of(session: &Session) -> Self {
        if session.is_finalized() {
            Self::Finalized
        } else if session.pending_question.is_some() {
            Self::AwaitingAnswer
        } else {
            Self::New
        }
    }
}

/// What caused this routing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger<'a> {
    /// New text or image input.
    Input,
    /// An answer that has already been recorded in the session's answer log.
    Answer {
        question_id: &'a str,
        answer: &'a str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterDecision {
    Ask(&'static Question),
    /// Continue was chosen; wait for more text or another image.
    AwaitInput,
    Finalize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionRouter {
    catalog: QuestionCatalog,
}

impl QuestionRouter {
    pub fn new(catalog: QuestionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn route(&self, session: &Session, category: Category, trigger: Trigger<'_>) -> RouterDecision {
        if let Trigger::Answer {
            question_id: CONTINUE_QUESTION_ID,
            answer,
        } = trigger
        {
            return if answer.trim().eq_ignore_ascii_case(FINALIZE_OPTION) {
                RouterDecision::Finalize
            } else {
                RouterDecision::AwaitInput
            };
        }

        let canonical = self.catalog.for_category(category);
        if session.has_answered(canonical.id) {
            RouterDecision::Ask(self.catalog.continuation())
        } else {
            RouterDecision::Ask(canonical)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InputMode;
    use crate::triage::classify::classify;

    fn router() -> QuestionRouter {
        QuestionRouter::default()
    }

    fn asked(decision: RouterDecision) -> &'static str {
        match decision {
            RouterDecision::Ask(q) => q.id,
            other => panic!("expected a question, got {other:?}"),
        }
    }

    #[test]
    fn fever_text_asks_systemic_question() {
        let mut s = Session::new(InputMode::Text);
        s.append_symptoms("I have a fever and chills");
        let category = classify(&s).category;
        assert_eq!(asked(router().route(&s, category, Trigger::Input)), "q_systemic_1");
    }

    #[test]
    fn redness_image_asks_skin_question() {
        let mut s = Session::new(InputMode::Image);
        s.add_observations(["redness"]);
        let category = classify(&s).category;
        assert_eq!(asked(router().route(&s, category, Trigger::Input)), "q_skin_1");
    }

    #[test]
    fn answered_canonical_question_moves_to_continuation() {
        let mut s = Session::new(InputMode::Text);
        s.append_symptoms("mild stomach ache");
        s.record_answer("q_gi_1", "None");
        let decision = router().route(
            &s,
            Category::Gi,
            Trigger::Answer {
                question_id: "q_gi_1",
                answer: "None",
            },
        );
        assert_eq!(asked(decision), CONTINUE_QUESTION_ID);
    }

    #[test]
    fn category_change_asks_new_canonical_question() {
        let mut s = Session::new(InputMode::Text);
        s.append_symptoms("mild stomach ache");
        s.record_answer("q_gi_1", "None");
        s.append_symptoms("and a migraine");
        let category = classify(&s).category;
        assert_eq!(category, Category::Headache);
        assert_eq!(asked(router().route(&s, category, Trigger::Input)), "q_headache_1");
    }

    #[test]
    fn finalize_answer_finalizes() {
        let s = Session::new(InputMode::Text);
        let decision = router().route(
            &s,
            Category::General,
            Trigger::Answer {
                question_id: CONTINUE_QUESTION_ID,
                answer: "No, finalize now",
            },
        );
        assert_eq!(decision, RouterDecision::Finalize);

        let decision = router().route(
            &s,
            Category::General,
            Trigger::Answer {
                question_id: CONTINUE_QUESTION_ID,
                answer: "  no, FINALIZE now ",
            },
        );
        assert_eq!(decision, RouterDecision::Finalize);
    }

    #[test]
    fn free_text_mentioning_finalize_does_not_finalize() {
        let s = Session::new(InputMode::Text);
        let decision = router().route(
            &s,
            Category::General,
            Trigger::Answer {
                question_id: CONTINUE_QUESTION_ID,
                answer: "don't finalize yet",
            },
        );
        assert_eq!(decision, RouterDecision::AwaitInput);
    }

    #[test]
    fn continue_answer_waits_for_input() {
        let s = Session::new(InputMode::Text);
        let decision = router().route(
            &s,
            Category::General,
            Trigger::Answer {
                question_id: CONTINUE_QUESTION_ID,
                answer: "Yes, add symptoms in text",
            },
        );
        assert_eq!(decision, RouterDecision::AwaitInput);
    }

    #[test]
    fn routing_is_deterministic_on_unchanged_session() {
        let mut s = Session::new(InputMode::Text);
        s.append_symptoms("headache");
        let category = classify(&s).category;
        let first = router().route(&s, category, Trigger::Input);
        let second = router().route(&s, category, Trigger::Input);
        assert_eq!(first, second);
    }

    #[test]
    fn state_is_derived_from_session() {
        let mut s = Session::new(InputMode::Text);
        assert_eq!(RouterState::of(&s), RouterState::New);
        s.pending_question = Some("q_general_1".into());
        assert_eq!(RouterState::of(&s), RouterState::AwaitingAnswer);
        s.finalize(crate::triage::summary::final_result(Category::General));
        assert_eq!(RouterState::of(&s), RouterState::Finalized);
    }
}
