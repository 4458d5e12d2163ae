//! Emergency pattern interceptor.
//!
//! Scans raw input text (case-insensitive) against an ordered set of
//! emergency patterns. The first match short-circuits the turn with a fixed
//! emergency payload; classification and question routing never run.

use regex::Regex;
use serde::Serialize;

use crate::models::triage_result::strings;
use crate::models::{Severity, TriageResult};

/// What kind of emergency a pattern indicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyKind {
    SelfHarm,
    Cardiac,
    Respiratory,
    Neurological,
    Bleeding,
}

/// A compiled emergency pattern with its audit id.
struct EmergencyPattern {
    id: &'static str,
    kind: EmergencyKind,
    regex: Regex,
}

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyVerdict {
    /// No emergency pattern matched; the input may proceed.
    Clear,
    /// An emergency pattern matched; `result` is the payload to return.
    Emergency {
        pattern_id: &'static str,
        kind: EmergencyKind,
        result: TriageResult,
    },
}

impl SafetyVerdict {
    #[cfg(test)]
    fn is_emergency(&self) -> bool {
        matches!(self, Self::Emergency { .. })
    }
}

pub const EMERGENCY_SUMMARY: &str = "CRITICAL SAFETY ALERT DETECTED.";
pub const EMERGENCY_RED_FLAG: &str = "Emergency keywords detected.";
pub const EMERGENCY_INSTRUCTION: &str =
    "IMMEDIATELY call emergency services (911/112) or go to the nearest ER.";

// ── Pattern table ───────────────────────────────────────────

/// Ordered (id, kind, regex). Matched against lower-cased text.
const EMERGENCY_PATTERNS: &[(&str, EmergencyKind, &str)] = &[
    ("SH-001", EmergencyKind::SelfHarm, r"\bsuicid"),
    ("SH-002", EmergencyKind::SelfHarm, r"\bkill(?:ing)? myself\b"),
    ("SH-003", EmergencyKind::SelfHarm, r"\bwant(?:s)? to die\b"),
    ("SH-004", EmergencyKind::SelfHarm, r"\bend(?:ing)? my (?:own )?life\b"),
    ("CA-001", EmergencyKind::Cardiac, r"\bchest pain\b"),
    ("CA-002", EmergencyKind::Cardiac, r"\bheart attack\b"),
    (
        "RE-001",
        EmergencyKind::Respiratory,
        r"\b(?:can'?t|can’t|cannot|can not|unable to) breathe\b",
    ),
    ("RE-002", EmergencyKind::Respiratory, r"\bnot breathing\b"),
    ("NE-001", EmergencyKind::Neurological, r"\bstroke\b"),
    ("BL-001", EmergencyKind::Bleeding, r"\bsevere bleeding\b"),
    (
        "BL-002",
        EmergencyKind::Bleeding,
        r"\b(?:uncontrolled|uncontrollable|won'?t stop) bleeding\b",
    ),
];

/// Immutable, compiled emergency pattern set. Built once at start-up.
pub struct SafetyInterceptor {
    patterns: Vec<EmergencyPattern>,
}

impl SafetyInterceptor {
    /// The standard emergency pattern set.
    pub fn standard() -> Self {
        let patterns = EMERGENCY_PATTERNS
            .iter()
            .map(|(id, kind, re)| EmergencyPattern {
                id,
                kind: *kind,
                regex: Regex::new(re).expect("Invalid emergency regex pattern"),
            })
            .collect();
        Self { patterns }
    }

    /// Check raw input. Returns on the first matching pattern.
    pub fn check(&self, text: &str) -> SafetyVerdict {
        let lower = text.to_lowercase();

        for pattern in &self.patterns {
            if pattern.regex.is_match(&lower) {
                tracing::warn!(
                    pattern_id = pattern.id,
                    kind = ?pattern.kind,
                    "Emergency pattern matched, short-circuiting triage"
                );
                return SafetyVerdict::Emergency {
                    pattern_id: pattern.id,
                    kind: pattern.kind,
                    result: emergency_result(),
                };
            }
        }

        SafetyVerdict::Clear
    }

    /// Check several text fragments as one input (narrative plus qualifiers).
    pub fn check_all<'a, I>(&self, parts: I) -> SafetyVerdict
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = parts.into_iter().collect::<Vec<_>>().join("\n");
        self.check(&joined)
    }

    #[cfg(test)]
    fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

/// The fixed emergency payload.
pub fn emergency_result() -> TriageResult {
    TriageResult {
        summary: EMERGENCY_SUMMARY.to_string(),
        severity: Severity::High,
        possible_causes: Vec::new(),
        home_care: Vec::new(),
        prevention: Vec::new(),
        red_flags: strings(&[EMERGENCY_RED_FLAG]),
        when_to_seek_care: strings(&[EMERGENCY_INSTRUCTION]),
        disclaimer: "This system detected potential emergency symptoms.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interceptor() -> SafetyInterceptor {
        SafetyInterceptor::standard()
    }

    fn pattern_id(verdict: &SafetyVerdict) -> &'static str {
        match verdict {
            SafetyVerdict::Emergency { pattern_id, .. } => pattern_id,
            SafetyVerdict::Clear => panic!("expected emergency verdict"),
        }
    }

    #[test]
    fn self_harm_intent_fires() {
        let verdict = interceptor().check("I want to kill myself");
        assert_eq!(pattern_id(&verdict), "SH-002");
        match verdict {
            SafetyVerdict::Emergency { kind, result, .. } => {
                assert_eq!(kind, EmergencyKind::SelfHarm);
                assert_eq!(result.severity, Severity::High);
                assert!(result.possible_causes.is_empty());
                assert_eq!(result.red_flags, vec![EMERGENCY_RED_FLAG.to_string()]);
                assert!(result.when_to_seek_care[0].contains("emergency services"));
            }
            SafetyVerdict::Clear => unreachable!(),
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(interceptor().check("SEVERE CHEST PAIN since morning").is_emergency());
        assert!(interceptor().check("Thinking about Suicide").is_emergency());
    }

    #[test]
    fn breathing_variants_fire() {
        for text in [
            "I cant breathe",
            "i can't breathe well",
            "I can’t breathe",
            "my son cannot breathe",
            "unable to breathe at night",
        ] {
            assert!(interceptor().check(text).is_emergency(), "{text}");
        }
    }

    #[test]
    fn acute_physical_emergencies_fire() {
        assert_eq!(pattern_id(&interceptor().check("possible stroke")), "NE-001");
        assert_eq!(
            pattern_id(&interceptor().check("there is severe bleeding from the cut")),
            "BL-001"
        );
        assert_eq!(
            pattern_id(&interceptor().check("the cut won't stop bleeding")),
            "BL-002"
        );
        assert_eq!(pattern_id(&interceptor().check("heart attack?")), "CA-002");
    }

    #[test]
    fn first_match_in_table_order_wins() {
        let verdict = interceptor().check("chest pain and I want to die");
        assert_eq!(pattern_id(&verdict), "SH-003");
    }

    #[test]
    fn ordinary_symptoms_pass_through() {
        for text in [
            "I have a fever and chills",
            "mild stomach ache",
            "headache behind the eyes",
            "small cut, bleeding controlled",
            "",
        ] {
            assert_eq!(interceptor().check(text), SafetyVerdict::Clear, "{text}");
        }
    }

    #[test]
    fn word_boundaries_prevent_false_positives() {
        assert_eq!(interceptor().check("chestnut painting"), SafetyVerdict::Clear);
        assert_eq!(interceptor().check("brushstroke art"), SafetyVerdict::Clear);
    }

    #[test]
    fn check_is_idempotent() {
        let i = interceptor();
        let first = i.check("I want to die");
        let second = i.check("I want to die");
        assert_eq!(first, second);
    }

    #[test]
    fn check_all_scans_qualifiers() {
        let verdict = interceptor().check_all(["tired", "mild", "chest pain for an hour"]);
        assert!(verdict.is_emergency());
    }

    #[test]
    fn pattern_table_compiles() {
        assert_eq!(interceptor().pattern_count(), EMERGENCY_PATTERNS.len());
    }
}
