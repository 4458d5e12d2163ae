//! Deterministic keyword scoring pass over a single message.
//!
//! Each pattern contributes its weight at most once. Reasons are reported in
//! table order so the same text always yields the same explanation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalGroup {
    SelfHarm,
    Hopelessness,
    Distress,
    LowMood,
}

impl SignalGroup {
    pub fn weight(self) -> u32 {
        match self {
            Self::SelfHarm => 20,
            Self::Hopelessness => 10,
            Self::Distress => 5,
            Self::LowMood => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::SelfHarm => "self-harm intent",
            Self::Hopelessness => "hopelessness",
            Self::Distress => "acute distress",
            Self::LowMood => "low mood",
        }
    }
}

struct WeightedPattern {
    regex: Regex,
    group: SignalGroup,
    phrase: &'static str,
}

static SCORING_PATTERNS: LazyLock<Vec<WeightedPattern>> = LazyLock::new(|| {
    vec![
        // Self-harm intent
        pattern(r"(?i)\bsuicid", SignalGroup::SelfHarm, "suicide"),
        pattern(r"(?i)\bkill(?:ing)?\s+myself\b", SignalGroup::SelfHarm, "kill myself"),
        pattern(r"(?i)\bwant(?:s)?\s+to\s+die\b", SignalGroup::SelfHarm, "want to die"),
        pattern(r"(?i)\bend(?:ing)?\s+my\s+life\b", SignalGroup::SelfHarm, "end my life"),
        pattern(
            r"(?i)\b(?:hurt|harm|cut)(?:ing)?\s+myself\b|\bself[-\s]?harm",
            SignalGroup::SelfHarm,
            "hurt myself",
        ),
        pattern(
            r"(?i)\bbetter\s+off\s+dead\b|\bno\s+reason\s+to\s+live\b",
            SignalGroup::SelfHarm,
            "no reason to live",
        ),
        // Hopelessness
        pattern(r"(?i)\bhopeless", SignalGroup::Hopelessness, "hopeless"),
        pattern(r"(?i)\bworthless\b", SignalGroup::Hopelessness, "worthless"),
        pattern(
            r"(?i)\b(?:no\s+point|nothing\s+matters)\b",
            SignalGroup::Hopelessness,
            "no point",
        ),
        pattern(
            r"(?i)\b(?:can'?t|can’t|cannot)\s+go\s+on\b",
            SignalGroup::Hopelessness,
            "can't go on",
        ),
        pattern(r"(?i)\b(?:a\s+)?burden\s+to\b", SignalGroup::Hopelessness, "burden"),
        // Acute distress
        pattern(r"(?i)\bpanic", SignalGroup::Distress, "panic"),
        pattern(
            r"(?i)\b(?:can'?t|can’t|cannot)\s+cope\b",
            SignalGroup::Distress,
            "can't cope",
        ),
        pattern(r"(?i)\boverwhelm", SignalGroup::Distress, "overwhelmed"),
        pattern(r"(?i)\banxi(?:ous|ety)\b", SignalGroup::Distress, "anxious"),
        pattern(
            r"(?i)\b(?:can'?t|can’t|cannot)\s+stop\s+crying\b",
            SignalGroup::Distress,
            "can't stop crying",
        ),
        // Low mood
        pattern(r"(?i)\bsad(?:ness)?\b", SignalGroup::LowMood, "sad"),
        pattern(r"(?i)\blonely\b|\bloneliness\b", SignalGroup::LowMood, "lonely"),
        pattern(r"(?i)\bstressed\b", SignalGroup::LowMood, "stressed"),
        pattern(r"(?i)\b(?:feel(?:ing)?|felt)\s+(?:down|empty|low)\b", SignalGroup::LowMood, "feeling down"),
        pattern(r"(?i)\bexhausted\b", SignalGroup::LowMood, "exhausted"),
    ]
});

fn pattern(re: &str, group: SignalGroup, phrase: &'static str) -> WeightedPattern {
    WeightedPattern {
        regex: Regex::new(re).expect("Invalid scoring regex pattern"),
        group,
        phrase,
    }
}

/// Outcome of the keyword pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

pub fn score_text(text: &str) -> KeywordScore {
    let mut result = KeywordScore::default();

    for p in SCORING_PATTERNS.iter() {
        if p.regex.is_match(text) {
            result.score += p.group.weight();
            result.reasons.push(format!("{}: \"{}\"", p.group.label(), p.phrase));
        }
    }

    result
}

/// Map a keyword score onto the risk scale.
pub fn level_for_score(score: u32) -> RiskLevel {
    match score {
        0 => RiskLevel::None,
        1..=4 => RiskLevel::Low,
        5..=9 => RiskLevel::Medium,
        10..=19 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}
