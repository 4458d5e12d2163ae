//! Priority rule tables mapping extracted signals to a clinical category.
//!
//! Rules are ordered `(id, predicate, category)` entries evaluated top-down;
//! the first match wins. Precedence is part of the contract: the category
//! selects both the follow-up question and the final advisory content.

use crate::models::{Category, InputMode, Session};

use super::signals::{extract_observations, extract_text, ObservationSignals, TextSignals};

/// Result of a classification pass, with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub rule_id: &'static str,
}

struct TextRule {
    id: &'static str,
    when: fn(&TextSignals) -> bool,
    category: Category,
}

struct ObservationRule {
    id: &'static str,
    when: fn(&ObservationSignals) -> bool,
    category: Category,
}

// ── Rule tables ─────────────────────────────────────────────

/// TEXT rules 1-4. GENERAL is applied separately, only in TEXT mode.
static TEXT_RULES: &[TextRule] = &[
    // TXT-1: any infection/fever keyword dominates
    TextRule {
        id: "TXT-1",
        when: |s| s.infection,
        category: Category::Fever,
    },
    // TXT-2: prolonged vomiting is a systemic risk
    TextRule {
        id: "TXT-2",
        when: |s| s.vomiting && s.long_duration,
        category: Category::Fever,
    },
    TextRule {
        id: "TXT-3",
        when: |s| s.headache,
        category: Category::Headache,
    },
    TextRule {
        id: "TXT-4",
        when: |s| s.gastrointestinal || s.vomiting,
        category: Category::Gi,
    },
];

static OBSERVATION_RULES: &[ObservationRule] = &[
    ObservationRule {
        id: "IMG-1",
        when: |o| o.wound_like,
        category: Category::Wound,
    },
    ObservationRule {
        id: "IMG-2",
        when: |o| o.skin_like,
        category: Category::Skin,
    },
];

const TEXT_DEFAULT: Classification = Classification {
    category: Category::General,
    rule_id: "TXT-DEFAULT",
};

/// No rule matched in any mode: surface the systemic pathway.
const FINAL_DEFAULT: Classification = Classification {
    category: Category::Fever,
    rule_id: "FINAL-DEFAULT",
};

// ── Evaluation ──────────────────────────────────────────────

/// Classify the current session snapshot. Depends only on `input_mode`,
/// `symptoms_text`, `duration` and `observations`.
pub fn classify(session: &Session) -> Classification {
    let text = extract_text(&session.symptoms_text, session.duration.as_deref());
    let observations = extract_observations(&session.observations);
    let has_text = !session.symptoms_text.trim().is_empty();
    classify_signals(session.input_mode, &text, &observations, has_text)
}

pub fn classify_signals(
    mode: InputMode,
    text: &TextSignals,
    observations: &ObservationSignals,
    has_text: bool,
) -> Classification {
    match mode {
        InputMode::Text => first_text_match(text).unwrap_or(TEXT_DEFAULT),
        InputMode::Image | InputMode::Mixed => {
            if let Some(hit) = first_observation_match(observations) {
                return hit;
            }
            // MIXED re-applies TEXT rules 1-4 only; GENERAL is never reached here
            if mode == InputMode::Mixed && has_text {
                if let Some(hit) = first_text_match(text) {
                    return hit;
                }
            }
            FINAL_DEFAULT
        }
    }
}

fn first_text_match(signals: &TextSignals) -> Option<Classification> {
    TEXT_RULES
        .iter()
        .find(|rule| (rule.when)(signals))
        .map(|rule| Classification {
            category: rule.category,
            rule_id: rule.id,
        })
}

fn first_observation_match(signals: &ObservationSignals) -> Option<Classification> {
    OBSERVATION_RULES
        .iter()
        .find(|rule| (rule.when)(signals))
        .map(|rule| Classification {
            category: rule.category,
            rule_id: rule.id,
        })
}
