//! Session state machine for symptom triage.
//!
//! Every turn runs under the session's lock: load the snapshot, apply the
//! input to a copy, re-classify from the full accumulated data, route, and
//! write the snapshot back in one statement. A failed write leaves the
//! stored session untouched.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{DatabaseError, TriageRepository};
use crate::locks::KeyedLocks;
use crate::models::{Category, InputMode, Question, Session, SessionStatus, TriageResult};
use crate::observation::{observe, ObservationSource};
use crate::safety::{SafetyInterceptor, SafetyVerdict};
use crate::triage::{classify, final_result, QuestionRouter, RouterDecision, RouterState, Trigger};

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} is already finalized")]
    SessionFinalized(String),

    #[error("Answer does not match the pending question (expected {expected:?}, got {received})")]
    QuestionMismatch {
        expected: Option<String>,
        received: String,
    },

    #[error("Input is empty")]
    EmptyInput,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Free-text part of an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub symptoms: String,
    pub severity: Option<String>,
    pub duration: Option<String>,
}

impl TextInput {
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self {
            symptoms: symptoms.into(),
            ..Self::default()
        }
    }

    fn is_blank(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
        self.symptoms.trim().is_empty() && blank(&self.severity) && blank(&self.duration)
    }

    fn parts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.symptoms.as_str())
            .chain(self.severity.as_deref())
            .chain(self.duration.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageInput {
    Text(TextInput),
    Image(Vec<u8>),
    Mixed { text: TextInput, image: Vec<u8> },
}

impl TriageInput {
    pub fn mode(&self) -> InputMode {
        match self {
            Self::Text(_) => InputMode::Text,
            Self::Image(_) => InputMode::Image,
            Self::Mixed { .. } => InputMode::Mixed,
        }
    }

    fn text(&self) -> Option<&TextInput> {
        match self {
            Self::Text(text) | Self::Mixed { text, .. } => Some(text),
            Self::Image(_) => None,
        }
    }

    fn image(&self) -> Option<&[u8]> {
        match self {
            Self::Image(image) | Self::Mixed { image, .. } => Some(image),
            Self::Text(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_blank(),
            Self::Image(image) => image.is_empty(),
            Self::Mixed { text, image } => text.is_blank() && image.is_empty(),
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageResponse {
    pub session_id: String,
    /// `None` when the safety interceptor fired.
    pub category: Option<Category>,
    pub status: SessionStatus,
    pub next_question: Option<Question>,
    pub final_result: Option<TriageResult>,
}

/// Read-only view of a session with its derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub category: Category,
    pub state: RouterState,
    pub pending_question: Option<Question>,
}

pub struct TriageEngine {
    repo: Arc<dyn TriageRepository>,
    safety: Arc<SafetyInterceptor>,
    router: QuestionRouter,
    observations: Arc<dyn ObservationSource>,
    locks: KeyedLocks,
}

impl TriageEngine {
    pub fn new(
        repo: Arc<dyn TriageRepository>,
        safety: Arc<SafetyInterceptor>,
        router: QuestionRouter,
        observations: Arc<dyn ObservationSource>,
    ) -> Self {
        Self {
            repo,
            safety,
            router,
            observations,
            locks: KeyedLocks::new(),
        }
    }

    /// Start a new session, or add input to an existing active one.
    pub async fn start_or_continue(
        &self,
        session_id: Option<&str>,
        input: TriageInput,
    ) -> Result<TriageResponse, TriageError> {
        if input.is_blank() {
            return Err(TriageError::EmptyInput);
        }

        let (mut session, _guard) = match session_id {
            Some(id) => {
                let guard = self.locks.acquire(id).await;
                let mut session = self.load_active(id)?;
                session.input_mode = session.input_mode.merge(input.mode());
                (session, Some(guard))
            }
            None => (Session::new(input.mode()), None),
        };

        if let Some(text) = input.text() {
            let verdict = self.safety.check_all(text.parts());
            session.append_symptoms(&text.symptoms);
            session.set_qualifiers(text.severity.as_deref(), text.duration.as_deref());
            if let SafetyVerdict::Emergency { result, .. } = verdict {
                return self.commit_emergency(session, result);
            }
        }

        if let Some(image) = input.image().filter(|i| !i.is_empty()) {
            let tags = observe(self.observations.as_ref(), image).await;
            session.add_observations(tags);
        }

        let classification = classify(&session);
        let decision = self
            .router
            .route(&session, classification.category, Trigger::Input);
        tracing::info!(
            session_id = %session.id,
            mode = %session.input_mode,
            category = %classification.category,
            rule = classification.rule_id,
            "Triage input classified"
        );

        self.apply_decision(&mut session, classification.category, decision);
        self.commit(session, Some(classification.category))
    }

    /// Record an answer to the pending question and route the next step.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        question_id: &str,
        answer: &str,
    ) -> Result<TriageResponse, TriageError> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.load_active(session_id)?;

        if session.pending_question.as_deref() != Some(question_id) {
            return Err(TriageError::QuestionMismatch {
                expected: session.pending_question.clone(),
                received: question_id.to_string(),
            });
        }
        if answer.trim().is_empty() {
            return Err(TriageError::EmptyInput);
        }

        session.record_answer(question_id, answer);
        session.pending_question = None;

        if let SafetyVerdict::Emergency { result, .. } = self.safety.check(answer) {
            return self.commit_emergency(session, result);
        }

        let category = classify(&session).category;
        let decision = self.router.route(
            &session,
            category,
            Trigger::Answer {
                question_id,
                answer,
            },
        );
        tracing::info!(
            session_id = %session.id,
            question_id,
            category = %category,
            decision = decision_label(&decision),
            "Triage answer routed"
        );

        self.apply_decision(&mut session, category, decision);
        self.commit(session, Some(category))
    }

    /// Finalize an active session with the summary for its current category.
    pub async fn finalize(&self, session_id: &str) -> Result<TriageResponse, TriageError> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.load_active(session_id)?;

        let category = classify(&session).category;
        self.apply_decision(&mut session, category, RouterDecision::Finalize);
        self.commit(session, Some(category))
    }

    pub fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, TriageError> {
        let session = self
            .repo
            .load_session(session_id)?
            .ok_or_else(|| TriageError::SessionNotFound(session_id.to_string()))?;

        let pending_question = session
            .pending_question
            .as_deref()
            .and_then(|id| self.router.catalog().get(id))
            .copied();

        Ok(SessionSnapshot {
            category: classify(&session).category,
            state: RouterState::of(&session),
            pending_question,
            session,
        })
    }

    // ── Internals ───────────────────────────────────────────

    fn load_active(&self, session_id: &str) -> Result<Session, TriageError> {
        let session = self
            .repo
            .load_session(session_id)?
            .ok_or_else(|| TriageError::SessionNotFound(session_id.to_string()))?;
        if session.is_finalized() {
            return Err(TriageError::SessionFinalized(session_id.to_string()));
        }
        Ok(session)
    }

    fn apply_decision(&self, session: &mut Session, category: Category, decision: RouterDecision) {
        match decision {
            RouterDecision::Ask(question) => session.pending_question = Some(question.id.to_string()),
            RouterDecision::AwaitInput => session.pending_question = None,
            RouterDecision::Finalize => {
                session.finalize(final_result(category));
                tracing::info!(session_id = %session.id, category = %category, "Session finalized");
            }
        }
    }

    fn commit_emergency(
        &self,
        mut session: Session,
        result: TriageResult,
    ) -> Result<TriageResponse, TriageError> {
        session.finalize(result);
        tracing::warn!(session_id = %session.id, "Session finalized by safety interceptor");
        self.commit(session, None)
    }

    fn commit(
        &self,
        mut session: Session,
        category: Option<Category>,
    ) -> Result<TriageResponse, TriageError> {
        session.touch();
        self.repo.save_session_snapshot(&session)?;

        let next_question = session
            .pending_question
            .as_deref()
            .and_then(|id| self.router.catalog().get(id))
            .copied();

        Ok(TriageResponse {
            session_id: session.id,
            category,
            status: session.status,
            next_question,
            final_result: session.final_result,
        })
    }
}

fn decision_label(decision: &RouterDecision) -> &'static str {
    match decision {
        RouterDecision::Ask(q) => q.id,
        RouterDecision::AwaitInput => "await_input",
        RouterDecision::Finalize => "finalize",
    }
}
