use serde::{Deserialize, Serialize};

use super::enums::Severity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleCause {
    pub name: String,
    pub confidence: f32,
}

/// Structured advisory summary returned when a session is finalized,
/// or immediately when the safety interceptor fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub summary: String,
    pub severity: Severity,
    pub possible_causes: Vec<PossibleCause>,
    pub home_care: Vec<String>,
    pub prevention: Vec<String>,
    pub red_flags: Vec<String>,
    pub when_to_seek_care: Vec<String>,
    pub disclaimer: String,
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
