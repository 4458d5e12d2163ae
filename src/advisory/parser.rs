//! Parsing of advisory replies into structured opinions.
//!
//! A reply is first parsed as-is. On failure exactly one repair is tried:
//! the span from the first `{` to the last `}` (drops prose and code fences).

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{AdvisoryError, AdvisoryOpinion, CheckinSummary};
use crate::models::RiskLevel;

pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AdvisoryError> {
    let first_error = match serde_json::from_str(text.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let repaired = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(AdvisoryError::MalformedResponse(format!(
                "No JSON object found: {first_error}"
            )))
        }
    };

    serde_json::from_str(repaired).map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))
}

#[derive(Deserialize)]
struct RawOpinion {
    risk_level: Option<String>,
    #[serde(default)]
    self_harm_detected: bool,
    reply: Option<String>,
    #[serde(default)]
    advice: Vec<String>,
}

#[derive(Deserialize)]
struct RawCheckin {
    daily_summary: Option<String>,
    risk_level: Option<String>,
    #[serde(default)]
    self_harm_detected: bool,
    #[serde(default)]
    advice: Vec<String>,
    #[serde(default)]
    reply: String,
}

/// A missing level reads as medium; an unrecognised one is malformed.
fn parse_level(raw: Option<&str>) -> Result<RiskLevel, AdvisoryError> {
    match raw.map(|s| s.trim().to_lowercase()) {
        None => Ok(RiskLevel::Medium),
        Some(s) => RiskLevel::from_str(&s)
            .map_err(|_| AdvisoryError::MalformedResponse(format!("Unknown risk level: {s}"))),
    }
}

pub fn parse_opinion(text: &str) -> Result<AdvisoryOpinion, AdvisoryError> {
    let raw: RawOpinion = extract_json(text)?;
    let reply = raw
        .reply
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AdvisoryError::MalformedResponse("Missing reply".into()))?;

    Ok(AdvisoryOpinion {
        risk_level: parse_level(raw.risk_level.as_deref())?,
        self_harm_detected: raw.self_harm_detected,
        reply,
        advice: raw.advice,
    })
}

pub fn parse_checkin(text: &str) -> Result<CheckinSummary, AdvisoryError> {
    let raw: RawCheckin = extract_json(text)?;
    let daily_summary = raw
        .daily_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdvisoryError::MalformedResponse("Missing daily_summary".into()))?;

    Ok(CheckinSummary {
        daily_summary,
        risk_level: parse_level(raw.risk_level.as_deref())?,
        self_harm_detected: raw.self_harm_detected,
        advice: raw.advice,
        reply: raw.reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"{"risk_level":"low","self_harm_detected":false,"reply":"I'm listening.","advice":["Breathe"]}"#;

    #[test]
    fn parses_clean_json() {
        let o = parse_opinion(CLEAN).unwrap();
        assert_eq!(o.risk_level, RiskLevel::Low);
        assert_eq!(o.reply, "I'm listening.");
        assert_eq!(o.advice, vec!["Breathe".to_string()]);
    }

    #[test]
    fn repairs_fenced_json_with_prose() {
        let text = format!("Sure! Here is my analysis:\n```json\n{CLEAN}\n```\nTake care.");
        let o = parse_opinion(&text).unwrap();
        assert_eq!(o.risk_level, RiskLevel::Low);
    }

    #[test]
    fn level_is_case_insensitive_and_defaults_to_medium() {
        let o = parse_opinion(r#"{"risk_level":"HIGH","reply":"ok"}"#).unwrap();
        assert_eq!(o.risk_level, RiskLevel::High);
        let o = parse_opinion(r#"{"reply":"ok"}"#).unwrap();
        assert_eq!(o.risk_level, RiskLevel::Medium);
        assert!(!o.self_harm_detected);
    }

    #[test]
    fn unparseable_text_is_malformed() {
        for text in ["I cannot answer that.", "{not json}", "} backwards {", ""] {
            let err = parse_opinion(text).unwrap_err();
            assert!(matches!(err, AdvisoryError::MalformedResponse(_)), "{text}");
        }
    }

    #[test]
    fn unknown_level_and_missing_reply_are_malformed() {
        assert!(parse_opinion(r#"{"risk_level":"extreme","reply":"x"}"#).is_err());
        assert!(parse_opinion(r#"{"risk_level":"low","reply":"  "}"#).is_err());
    }

    #[test]
    fn parses_checkin_summary() {
        let s = parse_checkin(
            r#"{"daily_summary":"A calm day.","risk_level":"none","self_harm_detected":false,"advice":["Sleep"],"reply":"Well done."}"#,
        )
        .unwrap();
        assert_eq!(s.risk_level, RiskLevel::None);
        assert_eq!(s.daily_summary, "A calm day.");
        assert!(parse_checkin(r#"{"risk_level":"low"}"#).is_err());
    }
}
