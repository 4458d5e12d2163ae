//! Action selector: final risk level → ordered recommended actions.

use crate::models::RiskLevel;

static SELF_CARE: &[&str] = &[
    "Keep a short mood journal",
    "Maintain regular sleep and meals",
    "Spend a few minutes outdoors or moving",
];

static LOW: &[&str] = &[
    "Try a breathing or grounding exercise",
    "Talk to someone you trust about how you feel",
    "Keep a short mood journal",
];

static MEDIUM: &[&str] = &[
    "Check in with yourself again later today",
    "Reach out to a trusted friend or family member",
    "Consider booking a session with a counsellor",
];

static HIGH: &[&str] = &[
    "Contact a mental health professional today",
    "Call or text a crisis helpline",
    "Stay with someone you trust",
];

static CRITICAL: &[&str] = &[
    "Call emergency services (911/112) now",
    "Contact a crisis helpline immediately",
    "Remove anything you could use to hurt yourself",
    "Stay with someone you trust until help arrives",
];

/// Total over the five levels; every list is non-empty.
pub fn actions_for(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::None => SELF_CARE,
        RiskLevel::Low => LOW,
        RiskLevel::Medium => MEDIUM,
        RiskLevel::High => HIGH,
        RiskLevel::Critical => CRITICAL,
    }
}

pub fn select_actions(level: RiskLevel) -> Vec<String> {
    actions_for(level).iter().map(|a| a.to_string()).collect()
}
