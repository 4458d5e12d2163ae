//! Risk fusion: one authoritative risk level and self-harm flag from the
//! keyword pass and the (possibly absent) external opinion.

use crate::config::RiskPolicy;
use crate::models::{RiskAssessment, RiskLevel};

use super::keywords::{level_for_score, KeywordScore};

/// Fixed reply served instead of fallback text during an apparent high-severity event.
pub const CRISIS_MESSAGE: &str = "I hear that you are in pain. Please reach out for help immediately – you are not alone. I’ve listed some resources below.";

/// The structured part of an external advisory opinion used for fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalSignal {
    pub risk_level: RiskLevel,
    pub self_harm_detected: bool,
}

/// Fuse both sources. Never reports lower than either source.
///
/// 1. deterministic self-harm := score >= threshold
/// 2. final self-harm := external flag OR deterministic
/// 3. final level := max(external level or neutral default, score band)
/// 4. final self-harm raises the level to at least high
pub fn fuse(
    policy: &RiskPolicy,
    keywords: &KeywordScore,
    external: Option<ExternalSignal>,
) -> RiskAssessment {
    let deterministic_self_harm = keywords.score >= policy.self_harm_threshold;
    let external_self_harm = external.is_some_and(|e| e.self_harm_detected);
    let self_harm_flag = external_self_harm || deterministic_self_harm;

    let external_level = external.map(|e| e.risk_level);
    let baseline = external_level.unwrap_or(policy.neutral_default);
    let mut final_risk_level = baseline.max(level_for_score(keywords.score));
    if self_harm_flag {
        final_risk_level = final_risk_level.max(RiskLevel::High);
    }

    let mut reasons = keywords.reasons.clone();
    if deterministic_self_harm {
        reasons.push(format!(
            "keyword score {} at or above self-harm threshold {}",
            keywords.score, policy.self_harm_threshold
        ));
    }
    if external_self_harm {
        reasons.push("advisory service flagged self-harm".to_string());
    }

    tracing::debug!(
        keyword_score = keywords.score,
        external = ?external_level,
        risk_level = %final_risk_level,
        self_harm = self_harm_flag,
        "Risk fused"
    );

    RiskAssessment {
        keyword_score: keywords.score,
        external_risk_level: external_level,
        self_harm_flag,
        final_risk_level,
        reasons,
    }
}

/// Replace the reply with the crisis message when fallback content was
/// served during a high or critical event.
pub fn reply_override(reply: String, fallback_used: bool, level: RiskLevel) -> String {
    if fallback_used && level.is_elevated() {
        tracing::warn!(risk_level = %level, "Advisory fallback during elevated risk, serving crisis message");
        CRISIS_MESSAGE.to_string()
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::keywords::score_text;

    fn score(n: u32) -> KeywordScore {
        KeywordScore {
            score: n,
            reasons: Vec::new(),
        }
    }

    fn external(level: RiskLevel, self_harm: bool) -> Option<ExternalSignal> {
        Some(ExternalSignal {
            risk_level: level,
            self_harm_detected: self_harm,
        })
    }

    #[test]
    fn absent_opinion_uses_neutral_default() {
        let a = fuse(&RiskPolicy::default(), &score(0), None);
        assert_eq!(a.final_risk_level, RiskLevel::Medium);
        assert!(a.external_risk_level.is_none());
        assert!(!a.self_harm_flag);
    }

    #[test]
    fn keywords_raise_above_external_opinion() {
        let a = fuse(&RiskPolicy::default(), &score(12), external(RiskLevel::Low, false));
        assert_eq!(a.final_risk_level, RiskLevel::High);
    }

    #[test]
    fn external_opinion_raises_above_keywords() {
        let a = fuse(&RiskPolicy::default(), &score(0), external(RiskLevel::Critical, false));
        assert_eq!(a.final_risk_level, RiskLevel::Critical);
    }

    #[test]
    fn threshold_asserts_self_harm_regardless_of_opinion() {
        for ext in [None, external(RiskLevel::None, false), external(RiskLevel::Low, false)] {
            let a = fuse(&RiskPolicy::default(), &score(20), ext);
            assert!(a.self_harm_flag);
            assert!(a.final_risk_level >= RiskLevel::High);
        }
    }

    #[test]
    fn external_self_harm_floors_at_high() {
        let a = fuse(&RiskPolicy::default(), &score(0), external(RiskLevel::Low, true));
        assert!(a.self_harm_flag);
        assert_eq!(a.final_risk_level, RiskLevel::High);
    }

    #[test]
    fn threshold_is_a_policy_parameter() {
        let policy = RiskPolicy {
            self_harm_threshold: 30,
            ..RiskPolicy::default()
        };
        assert!(!fuse(&policy, &score(25), None).self_harm_flag);
        assert!(fuse(&policy, &score(30), None).self_harm_flag);
    }

    #[test]
    fn final_level_is_monotonic_in_keyword_score() {
        let opinions = [
            None,
            external(RiskLevel::None, false),
            external(RiskLevel::Medium, false),
            external(RiskLevel::High, true),
        ];
        for ext in opinions {
            let mut prev = RiskLevel::None;
            for n in 0..50 {
                let level = fuse(&RiskPolicy::default(), &score(n), ext).final_risk_level;
                assert!(level >= prev, "score {n} decreased level");
                prev = level;
            }
        }
    }

    #[test]
    fn timeout_with_high_score_serves_crisis_message() {
        let keywords = KeywordScore {
            score: 25,
            reasons: vec!["self-harm intent".into()],
        };
        let a = fuse(&RiskPolicy::default(), &keywords, None);
        assert!(a.final_risk_level >= RiskLevel::High);
        assert!(a.self_harm_flag);

        let reply = reply_override("fallback text".into(), true, a.final_risk_level);
        assert_eq!(reply, CRISIS_MESSAGE);
    }

    #[test]
    fn override_only_applies_to_fallback_content() {
        let reply = reply_override("model reply".into(), false, RiskLevel::Critical);
        assert_eq!(reply, "model reply");
        let reply = reply_override("fallback".into(), true, RiskLevel::Medium);
        assert_eq!(reply, "fallback");
    }

    #[test]
    fn reasons_explain_threshold() {
        let a = fuse(&RiskPolicy::default(), &score_text("I want to end my life"), None);
        assert_eq!(a.keyword_score, 20);
        assert!(a.reasons.iter().any(|r| r.contains("threshold")));
    }
}
