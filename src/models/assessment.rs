use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::RiskLevel;

/// Fused risk judgment for one inbound companion-chat message.
/// Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub keyword_score: u32,
    /// `None` when the advisory service was unavailable or its reply unusable.
    pub external_risk_level: Option<RiskLevel>,
    pub self_harm_flag: bool,
    pub final_risk_level: RiskLevel,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub user_id: String,
    pub date: NaiveDate,
    pub summary_text: String,
    pub risk_level: RiskLevel,
}
