//! Companion chat and daily check-in.
//!
//! Both flows ask the advisory service for an opinion, fuse it with the
//! deterministic keyword pass, pick actions from the final level, and
//! persist the turn. Turns for one user are serialized.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::advisory::AdvisoryService;
use crate::config::RiskPolicy;
use crate::db::{ChatTurnRecord, DatabaseError, TriageRepository};
use crate::locks::KeyedLocks;
use crate::models::{DailySummary, RiskLevel};
use crate::risk::{fuse, reply_override, score_text, select_actions};

pub const CHECKIN_QUESTIONS: [&str; 6] = [
    "How are you feeling right now (1–10)?",
    "What was the strongest emotion you felt today?",
    "What triggered stress or anxiety today?",
    "Did you sleep well last night?",
    "Name one thing that helped you get through today.",
    "Have you had any thoughts of hurting yourself?",
];

#[derive(Debug, thiserror::Error)]
pub enum WellbeingError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub risk_level: RiskLevel,
    pub self_harm_detected: bool,
    pub advice: Vec<String>,
    pub actions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinQuestions {
    pub date: NaiveDate,
    pub questions: Vec<String>,
    /// Summary already recorded for this date, if any.
    pub today_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinResult {
    pub daily_summary: String,
    pub risk_level: RiskLevel,
    pub self_harm_detected: bool,
    pub advice: Vec<String>,
    pub actions: Vec<String>,
    pub reply: String,
}

pub struct WellbeingService {
    repo: Arc<dyn TriageRepository>,
    advisory: AdvisoryService,
    policy: RiskPolicy,
    locks: KeyedLocks,
}

impl WellbeingService {
    pub fn new(repo: Arc<dyn TriageRepository>, advisory: AdvisoryService, policy: RiskPolicy) -> Self {
        Self {
            repo,
            advisory,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn process_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<ChatReply, WellbeingError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WellbeingError::EmptyMessage);
        }
        let _guard = self.locks.acquire(user_id).await;

        let outcome = self.advisory.evaluate(message).await;
        let keywords = score_text(message);
        let assessment = fuse(&self.policy, &keywords, outcome.external());
        let level = assessment.final_risk_level;
        let reply = reply_override(outcome.value.reply, outcome.fallback_used, level);

        self.repo.commit_chat_turn(&ChatTurnRecord {
            user_id: user_id.to_string(),
            user_text: message.to_string(),
            assessment: assessment.clone(),
            assistant_text: reply.clone(),
        })?;

        tracing::info!(
            risk_level = %level,
            keyword_score = assessment.keyword_score,
            self_harm = assessment.self_harm_flag,
            fallback = outcome.fallback_used,
            "Chat turn committed"
        );

        Ok(ChatReply {
            reply,
            risk_level: level,
            self_harm_detected: assessment.self_harm_flag,
            advice: outcome.value.advice,
            actions: select_actions(level),
            timestamp: Utc::now(),
        })
    }

    pub fn checkin_questions(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<CheckinQuestions, WellbeingError> {
        let today_summary = self
            .repo
            .get_daily_summary(user_id, date)?
            .map(|s| s.summary_text);

        Ok(CheckinQuestions {
            date,
            questions: CHECKIN_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            today_summary,
        })
    }

    pub async fn submit_checkin(
        &self,
        user_id: &str,
        date: NaiveDate,
        answers: &BTreeMap<String, String>,
    ) -> Result<CheckinResult, WellbeingError> {
        if answers.values().all(|a| a.trim().is_empty()) {
            return Err(WellbeingError::EmptyMessage);
        }
        let _guard = self.locks.acquire(user_id).await;

        let outcome = self.advisory.summarize_checkin(answers).await;
        let joined = answers.values().map(String::as_str).collect::<Vec<_>>().join("\n");
        let assessment = fuse(&self.policy, &score_text(&joined), outcome.external());
        let level = assessment.final_risk_level;
        let summary = outcome.value;

        self.repo.save_daily_summary(&DailySummary {
            user_id: user_id.to_string(),
            date,
            summary_text: summary.daily_summary.clone(),
            risk_level: level,
        })?;

        tracing::info!(
            risk_level = %level,
            keyword_score = assessment.keyword_score,
            fallback = outcome.fallback_used,
            "Daily check-in recorded"
        );

        Ok(CheckinResult {
            daily_summary: summary.daily_summary,
            risk_level: level,
            self_harm_detected: assessment.self_harm_flag,
            advice: summary.advice,
            actions: select_actions(level),
            reply: reply_override(summary.reply, outcome.fallback_used, level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::advisory::fallback::{CHECKIN_FALLBACK_SUMMARY, FALLBACK_REPLY};
    use crate::advisory::MockAdvisoryClient;
    use crate::db::SqliteStore;
    use crate::models::MessageRole;
    use crate::risk::CRISIS_MESSAGE;

    fn service(client: MockAdvisoryClient) -> (WellbeingService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let advisory = AdvisoryService::new(Arc::new(client), Duration::from_millis(200));
        (
            WellbeingService::new(store.clone(), advisory, RiskPolicy::default()),
            store,
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[tokio::test]
    async fn advisory_reply_is_served_and_persisted() {
        let (svc, store) = service(MockAdvisoryClient::new(
            r#"{"risk_level":"low","self_harm_detected":false,"reply":"That sounds like a long day.","advice":["Rest"]}"#,
        ));
        let reply = svc.process_message("u1", "Work was tiring today").await.unwrap();
        assert_eq!(reply.reply, "That sounds like a long day.");
        assert_eq!(reply.risk_level, RiskLevel::Low);
        assert!(!reply.actions.is_empty());

        let messages = store.list_messages("u1").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].text, "That sounds like a long day.");
        let events = store.list_risk_events("u1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message_id, Some(messages[0].id));
    }

    #[tokio::test]
    async fn timeout_with_self_harm_keywords_serves_crisis_message() {
        let slow = MockAdvisoryClient::new(r#"{"risk_level":"low","reply":"late"}"#)
            .with_delay(Duration::from_secs(5));
        let (svc, store) = service(slow);

        let reply = svc
            .process_message("u2", "I feel hopeless and I want to die")
            .await
            .unwrap();
        assert!(reply.risk_level >= RiskLevel::High);
        assert!(reply.self_harm_detected);
        assert_eq!(reply.reply, CRISIS_MESSAGE);

        let events = store.list_risk_events("u2").unwrap();
        assert_eq!(events[0].assessment.keyword_score, 30);
        assert!(events[0].assessment.external_risk_level.is_none());
    }

    #[tokio::test]
    async fn fallback_at_medium_keeps_fallback_text() {
        let (svc, _) = service(MockAdvisoryClient::failing("down"));
        let reply = svc.process_message("u3", "just checking in").await.unwrap();
        assert_eq!(reply.risk_level, RiskLevel::Medium);
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn advisory_self_harm_flag_is_honoured() {
        let (svc, _) = service(MockAdvisoryClient::new(
            r#"{"risk_level":"medium","self_harm_detected":true,"reply":"I'm worried about you.","advice":[]}"#,
        ));
        let reply = svc.process_message("u4", "I don't know anymore").await.unwrap();
        assert!(reply.self_harm_detected);
        assert_eq!(reply.risk_level, RiskLevel::High);
        assert_eq!(reply.reply, "I'm worried about you.");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let (svc, store) = service(MockAdvisoryClient::new("{}"));
        assert!(matches!(
            svc.process_message("u5", "   ").await.unwrap_err(),
            WellbeingError::EmptyMessage
        ));
        assert!(store.list_messages("u5").unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkin_is_summarised_and_stored() {
        let (svc, _) = service(MockAdvisoryClient::new(
            r#"{"daily_summary":"A steady day with good sleep.","risk_level":"low","self_harm_detected":false,"advice":["Keep it up"],"reply":"Nice work."}"#,
        ));
        let before = svc.checkin_questions("u6", date()).unwrap();
        assert_eq!(before.questions.len(), 6);
        assert!(before.today_summary.is_none());

        let answers = BTreeMap::from([
            (CHECKIN_QUESTIONS[0].to_string(), "7".to_string()),
            (CHECKIN_QUESTIONS[3].to_string(), "Yes".to_string()),
        ]);
        let result = svc.submit_checkin("u6", date(), &answers).await.unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.reply, "Nice work.");

        let after = svc.checkin_questions("u6", date()).unwrap();
        assert_eq!(after.today_summary.as_deref(), Some("A steady day with good sleep."));
    }

    #[tokio::test]
    async fn checkin_failure_uses_fallback_summary() {
        let (svc, _) = service(MockAdvisoryClient::failing("down"));
        let answers = BTreeMap::from([(CHECKIN_QUESTIONS[1].to_string(), "calm".to_string())]);
        let result = svc.submit_checkin("u7", date(), &answers).await.unwrap();
        assert_eq!(result.daily_summary, CHECKIN_FALLBACK_SUMMARY);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn checkin_self_harm_answer_escalates() {
        let (svc, _) = service(MockAdvisoryClient::failing("down"));
        let answers = BTreeMap::from([(
            CHECKIN_QUESTIONS[5].to_string(),
            "yes, I thought about ending my life".to_string(),
        )]);
        let result = svc.submit_checkin("u8", date(), &answers).await.unwrap();
        assert!(result.self_harm_detected);
        assert!(result.risk_level.is_elevated());
        assert_eq!(result.reply, CRISIS_MESSAGE);
    }

    #[tokio::test]
    async fn user_locks_are_released_after_turns() {
        let (svc, _) = service(MockAdvisoryClient::failing("down"));
        for i in 0..20 {
            svc.process_message(&format!("user-{i}"), "hello").await.unwrap();
        }
        let answers = BTreeMap::from([(CHECKIN_QUESTIONS[0].to_string(), "6".to_string())]);
        svc.submit_checkin("user-0", date(), &answers).await.unwrap();
        assert!(svc.locks.is_empty());
    }

    #[tokio::test]
    async fn empty_checkin_is_rejected() {
        let (svc, _) = service(MockAdvisoryClient::new("{}"));
        let answers = BTreeMap::from([("q".to_string(), " ".to_string())]);
        assert!(matches!(
            svc.submit_checkin("u9", date(), &answers).await.unwrap_err(),
            WellbeingError::EmptyMessage
        ));
    }
}
