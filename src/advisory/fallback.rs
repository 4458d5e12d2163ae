//! Fixed payloads served whenever the advisory service cannot answer.

use super::{AdvisoryOpinion, CheckinSummary};
use crate::models::triage_result::strings;
use crate::models::RiskLevel;

pub const FALLBACK_REPLY: &str = "I’m here with you. Something went wrong with my thought process, but I want to support you. Can you tell me more?";

pub const CHECKIN_FALLBACK_SUMMARY: &str = "Unable to generate summary at this moment.";
pub const CHECKIN_FALLBACK_REPLY: &str = "Thank you for checking in. Take care of yourself today.";

pub const SYSTEM_PROMPT: &str = r#"You are a mental health support AI.

Rules:
- Be warm, calm, non-judgmental.
- Act like a supportive friend with professional calmness.
- Detect self-harm or suicidal intent.
- Give practical, safe advice.
- Encourage real-world support if risk is high.

Return ONLY valid JSON in this exact format:
{
  "risk_level": "none | low | medium | high | critical",
  "self_harm_detected": true/false,
  "reply": "what the user sees",
  "advice": ["step 1", "step 2", "step 3"]
}
"#;

pub const CHECKIN_SYSTEM_PROMPT: &str = "You are a compassionate mental health assistant.";

pub fn opinion() -> AdvisoryOpinion {
    AdvisoryOpinion {
        risk_level: RiskLevel::Medium,
        self_harm_detected: false,
        reply: FALLBACK_REPLY.to_string(),
        advice: strings(&[
            "Take a slow breath",
            "Reach out to a trusted friend",
            "Focus on the present moment",
        ]),
    }
}

pub fn checkin_summary() -> CheckinSummary {
    CheckinSummary {
        daily_summary: CHECKIN_FALLBACK_SUMMARY.to_string(),
        risk_level: RiskLevel::Medium,
        self_harm_detected: false,
        advice: strings(&["Get some rest", "Stay hydrated"]),
        reply: CHECKIN_FALLBACK_REPLY.to_string(),
    }
}
