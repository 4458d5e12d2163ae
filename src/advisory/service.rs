use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::fallback::{self, CHECKIN_SYSTEM_PROMPT, SYSTEM_PROMPT};
use super::parser::{parse_checkin, parse_opinion};
use super::{AdvisoryClient, AdvisoryError, AdvisoryOpinion, CheckinSummary};
use crate::risk::ExternalSignal;

/// An advisory result plus whether it came from the fixed fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryOutcome<T> {
    pub value: T,
    pub fallback_used: bool,
}

impl AdvisoryOutcome<AdvisoryOpinion> {
    /// The external signal for fusion; absent when the fallback was served.
    pub fn external(&self) -> Option<ExternalSignal> {
        (!self.fallback_used).then(|| self.value.signal())
    }
}

impl AdvisoryOutcome<CheckinSummary> {
    pub fn external(&self) -> Option<ExternalSignal> {
        (!self.fallback_used).then(|| self.value.signal())
    }
}

/// Wraps an [`AdvisoryClient`] with a hard timeout, parsing, and fallback.
/// Its methods are infallible.
#[derive(Clone)]
pub struct AdvisoryService {
    client: Arc<dyn AdvisoryClient>,
    timeout: Duration,
}

impl AdvisoryService {
    pub fn new(client: Arc<dyn AdvisoryClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn evaluate(&self, message: &str) -> AdvisoryOutcome<AdvisoryOpinion> {
        let prompt = format!("User message: \"\"\"{message}\"\"\"");
        match self.call(SYSTEM_PROMPT, &prompt).await.and_then(|t| parse_opinion(&t)) {
            Ok(value) => AdvisoryOutcome {
                value,
                fallback_used: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Advisory evaluation failed, using fallback");
                AdvisoryOutcome {
                    value: fallback::opinion(),
                    fallback_used: true,
                }
            }
        }
    }

    pub async fn summarize_checkin(
        &self,
        answers: &BTreeMap<String, String>,
    ) -> AdvisoryOutcome<CheckinSummary> {
        let prompt = checkin_prompt(answers);
        match self
            .call(CHECKIN_SYSTEM_PROMPT, &prompt)
            .await
            .and_then(|t| parse_checkin(&t))
        {
            Ok(value) => AdvisoryOutcome {
                value,
                fallback_used: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Check-in summary failed, using fallback");
                AdvisoryOutcome {
                    value: fallback::checkin_summary(),
                    fallback_used: true,
                }
            }
        }
    }

    async fn call(&self, system: &str, user: &str) -> Result<String, AdvisoryError> {
        tokio::time::timeout(self.timeout, self.client.complete(system, user))
            .await
            .map_err(|_| AdvisoryError::Timeout(self.timeout.as_secs()))?
    }
}

fn checkin_prompt(answers: &BTreeMap<String, String>) -> String {
    let formatted = answers
        .iter()
        .map(|(q, a)| format!("{q}: {a}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze these daily check-in answers for a user's mental health context:
{formatted}

Return ONLY valid JSON:
{{
    "daily_summary": "Short 2-sentence supportive summary of their state",
    "risk_level": "none | low | medium | high | critical",
    "self_harm_detected": true/false,
    "advice": ["advice 1", "advice 2"],
    "reply": "A short comforting message to show immediately"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::fallback::{CHECKIN_FALLBACK_SUMMARY, FALLBACK_REPLY};
    use crate::advisory::MockAdvisoryClient;
    use crate::models::RiskLevel;

    fn service(client: MockAdvisoryClient) -> AdvisoryService {
        AdvisoryService::new(Arc::new(client), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn well_formed_reply_is_used() {
        let svc = service(MockAdvisoryClient::new(
            r#"{"risk_level":"high","self_harm_detected":true,"reply":"Stay with me.","advice":[]}"#,
        ));
        let outcome = svc.evaluate("hello").await;
        assert!(!outcome.fallback_used);
        assert_eq!(outcome.value.risk_level, RiskLevel::High);
        let signal = outcome.external().unwrap();
        assert!(signal.self_harm_detected);
    }

    #[tokio::test]
    async fn failure_degrades_to_fallback() {
        let outcome = service(MockAdvisoryClient::failing("refused")).evaluate("hi").await;
        assert!(outcome.fallback_used);
        assert_eq!(outcome.value.reply, FALLBACK_REPLY);
        assert_eq!(outcome.value.risk_level, RiskLevel::Medium);
        assert!(outcome.external().is_none());
    }

    #[tokio::test]
    async fn malformed_reply_degrades_to_fallback() {
        let outcome = service(MockAdvisoryClient::new("I am not JSON")).evaluate("hi").await;
        assert!(outcome.fallback_used);
    }

    #[tokio::test]
    async fn timeout_degrades_to_fallback() {
        let slow = MockAdvisoryClient::new(r#"{"risk_level":"low","reply":"late"}"#)
            .with_delay(Duration::from_secs(5));
        let outcome = service(slow).evaluate("hi").await;
        assert!(outcome.fallback_used);
        assert_eq!(outcome.value.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn checkin_failure_uses_fixed_summary() {
        let answers = BTreeMap::from([("Did you sleep well last night?".to_string(), "No".to_string())]);
        let outcome = service(MockAdvisoryClient::failing("down"))
            .summarize_checkin(&answers)
            .await;
        assert!(outcome.fallback_used);
        assert_eq!(outcome.value.daily_summary, CHECKIN_FALLBACK_SUMMARY);
        assert_eq!(outcome.value.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn checkin_prompt_lists_answers_in_order() {
        let answers = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let prompt = checkin_prompt(&answers);
        let a = prompt.find("a: 1").unwrap();
        let b = prompt.find("b: 2").unwrap();
        assert!(a < b);
    }
}
