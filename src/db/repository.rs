//! Persistence collaborator: append/lookup operations over the triage schema.
//!
//! Free functions take a `&Connection` (testable against an in-memory DB);
//! `SqliteStore` wraps one connection behind a mutex and implements the
//! `TriageRepository` seam used by the engine and the wellbeing service.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{open_database, open_memory_database, DatabaseError};
use crate::models::*;

/// Everything written for one companion-chat turn. Committed atomically.
#[derive(Debug, Clone)]
pub struct ChatTurnRecord {
    pub user_id: String,
    pub user_text: String,
    pub assessment: RiskAssessment,
    pub assistant_text: String,
}

/// A persisted risk event row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRiskEvent {
    pub id: i64,
    pub user_id: String,
    pub message_id: Option<i64>,
    pub assessment: RiskAssessment,
    pub created_at: DateTime<Utc>,
}

/// A persisted chat message row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: i64,
    pub user_id: String,
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Storage seam required by the decision core.
pub trait TriageRepository: Send + Sync {
    fn save_session_snapshot(&self, session: &Session) -> Result<(), DatabaseError>;
    fn load_session(&self, id: &str) -> Result<Option<Session>, DatabaseError>;
    fn save_message(&self, user_id: &str, role: MessageRole, text: &str)
        -> Result<i64, DatabaseError>;
    fn save_risk_event(
        &self,
        user_id: &str,
        message_id: Option<i64>,
        assessment: &RiskAssessment,
    ) -> Result<i64, DatabaseError>;
    /// Save user message, risk event and assistant message in one transaction.
    /// Returns the user message id.
    fn commit_chat_turn(&self, turn: &ChatTurnRecord) -> Result<i64, DatabaseError>;
    fn save_daily_summary(&self, summary: &DailySummary) -> Result<i64, DatabaseError>;
    fn get_daily_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, DatabaseError>;
    fn list_messages(&self, user_id: &str) -> Result<Vec<StoredMessage>, DatabaseError>;
    fn list_risk_events(&self, user_id: &str) -> Result<Vec<StoredRiskEvent>, DatabaseError>;
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

pub fn upsert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    let observations_json = serde_json::to_string(&session.observations)?;
    let answers_json = serde_json::to_string(&session.answers)?;
    let final_result_json = session
        .final_result
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO triage_sessions
            (id, input_mode, symptoms_text, severity, duration, observations_json,
             pending_question, answers_json, status, final_result_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
            input_mode = excluded.input_mode,
            symptoms_text = excluded.symptoms_text,
            severity = excluded.severity,
            duration = excluded.duration,
            observations_json = excluded.observations_json,
            pending_question = excluded.pending_question,
            answers_json = excluded.answers_json,
            status = excluded.status,
            final_result_json = excluded.final_result_json,
            updated_at = excluded.updated_at",
        params![
            session.id,
            session.input_mode.as_str(),
            session.symptoms_text,
            session.severity,
            session.duration,
            observations_json,
            session.pending_question,
            answers_json,
            session.status.as_str(),
            final_result_json,
            session.created_at.to_rfc3339(),
            session.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

struct SessionRow {
    id: String,
    input_mode: String,
    symptoms_text: String,
    severity: Option<String>,
    duration: Option<String>,
    observations_json: String,
    pending_question: Option<String>,
    answers_json: String,
    status: String,
    final_result_json: Option<String>,
    created_at: String,
    updated_at: String,
}

pub fn get_session(conn: &Connection, id: &str) -> Result<Option<Session>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, input_mode, symptoms_text, severity, duration, observations_json,
                    pending_question, answers_json, status, final_result_json, created_at, updated_at
             FROM triage_sessions WHERE id = ?1",
            params![id],
            |row| {
                Ok(SessionRow {
                    id: row.get(0)?,
                    input_mode: row.get(1)?,
                    symptoms_text: row.get(2)?,
                    severity: row.get(3)?,
                    duration: row.get(4)?,
                    observations_json: row.get(5)?,
                    pending_question: row.get(6)?,
                    answers_json: row.get(7)?,
                    status: row.get(8)?,
                    final_result_json: row.get(9)?,
                    created_at: row.get(10)?,
                    updated_at: row.get(11)?,
                })
            },
        )
        .optional()?;

    row.map(session_from_row).transpose()
}

fn session_from_row(row: SessionRow) -> Result<Session, DatabaseError> {
    let observations: BTreeSet<String> = serde_json::from_str(&row.observations_json)?;
    let answers: Vec<AnswerRecord> = serde_json::from_str(&row.answers_json)?;
    let final_result = row
        .final_result_json
        .as_deref()
        .map(serde_json::from_str::<TriageResult>)
        .transpose()?;

    Ok(Session {
        id: row.id,
        input_mode: InputMode::from_str(&row.input_mode)?,
        symptoms_text: row.symptoms_text,
        severity: row.severity,
        duration: row.duration,
        observations,
        pending_question: row.pending_question,
        answers,
        status: SessionStatus::from_str(&row.status)?,
        final_result,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

// ═══════════════════════════════════════════════════════════
// Messages & risk events
// ═══════════════════════════════════════════════════════════

pub fn insert_message(
    conn: &Connection,
    user_id: &str,
    role: MessageRole,
    text: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO messages (user_id, role, text, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, role.as_str(), text, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_risk_event(
    conn: &Connection,
    user_id: &str,
    message_id: Option<i64>,
    assessment: &RiskAssessment,
) -> Result<i64, DatabaseError> {
    let reasons_json = serde_json::to_string(&assessment.reasons)?;
    conn.execute(
        "INSERT INTO risk_events
            (user_id, message_id, risk_level, external_risk_level, self_harm_detected,
             keyword_score, reasons_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id,
            message_id,
            assessment.final_risk_level.as_str(),
            assessment.external_risk_level.map(|l| l.as_str()),
            assessment.self_harm_flag,
            assessment.keyword_score,
            reasons_json,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_messages_by_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<StoredMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, role, text, created_at FROM messages
         WHERE user_id = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        let (id, user_id, role, text, created_at) = row?;
        messages.push(StoredMessage {
            id,
            user_id,
            role: MessageRole::from_str(&role)?,
            text,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(messages)
}

pub fn get_risk_events_by_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<StoredRiskEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message_id, risk_level, external_risk_level, self_harm_detected,
                keyword_score, reasons_json, created_at
         FROM risk_events WHERE user_id = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(RiskEventRow {
            id: row.get(0)?,
            user_id: row.get(1)?,
            message_id: row.get(2)?,
            risk_level: row.get(3)?,
            external_risk_level: row.get(4)?,
            self_harm_detected: row.get(5)?,
            keyword_score: row.get(6)?,
            reasons_json: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;

    let mut events = Vec::new();
    for row in rows {
        events.push(risk_event_from_row(row?)?);
    }
    Ok(events)
}

struct RiskEventRow {
    id: i64,
    user_id: String,
    message_id: Option<i64>,
    risk_level: String,
    external_risk_level: Option<String>,
    self_harm_detected: bool,
    keyword_score: u32,
    reasons_json: String,
    created_at: String,
}

fn risk_event_from_row(row: RiskEventRow) -> Result<StoredRiskEvent, DatabaseError> {
    Ok(StoredRiskEvent {
        id: row.id,
        user_id: row.user_id,
        message_id: row.message_id,
        assessment: RiskAssessment {
            keyword_score: row.keyword_score,
            external_risk_level: row
                .external_risk_level
                .as_deref()
                .map(RiskLevel::from_str)
                .transpose()?,
            self_harm_flag: row.self_harm_detected,
            final_risk_level: RiskLevel::from_str(&row.risk_level)?,
            reasons: serde_json::from_str(&row.reasons_json)?,
        },
        created_at: parse_timestamp(&row.created_at)?,
    })
}

// ═══════════════════════════════════════════════════════════
// Daily summaries
// ═══════════════════════════════════════════════════════════

pub fn insert_daily_summary(
    conn: &Connection,
    summary: &DailySummary,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO daily_summaries (user_id, date, summary_text, risk_level, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            summary.user_id,
            summary.date.to_string(),
            summary.summary_text,
            summary.risk_level.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent summary for `user_id` on `date`.
pub fn find_daily_summary(
    conn: &Connection,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<DailySummary>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT summary_text, risk_level FROM daily_summaries
             WHERE user_id = ?1 AND date = ?2 ORDER BY id DESC LIMIT 1",
            params![user_id, date.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    row.map(|(summary_text, risk_level)| -> Result<DailySummary, DatabaseError> {
        Ok(DailySummary {
            user_id: user_id.to_string(),
            date,
            summary_text,
            risk_level: RiskLevel::from_str(&risk_level)?,
        })
    })
    .transpose()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidTimestamp(format!("{value}: {e}")))
}

// ═══════════════════════════════════════════════════════════
// SqliteStore
// ═══════════════════════════════════════════════════════════

/// SQLite-backed `TriageRepository`. One connection, serialized by a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_database(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_memory_database()?),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl TriageRepository for SqliteStore {
    fn save_session_snapshot(&self, session: &Session) -> Result<(), DatabaseError> {
        upsert_session(&*self.conn()?, session)
    }

    fn load_session(&self, id: &str) -> Result<Option<Session>, DatabaseError> {
        get_session(&*self.conn()?, id)
    }

    fn save_message(
        &self,
        user_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<i64, DatabaseError> {
        insert_message(&*self.conn()?, user_id, role, text)
    }

    fn save_risk_event(
        &self,
        user_id: &str,
        message_id: Option<i64>,
        assessment: &RiskAssessment,
    ) -> Result<i64, DatabaseError> {
        insert_risk_event(&*self.conn()?, user_id, message_id, assessment)
    }

    fn commit_chat_turn(&self, turn: &ChatTurnRecord) -> Result<i64, DatabaseError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let message_id = insert_message(&tx, &turn.user_id, MessageRole::User, &turn.user_text)?;
        insert_risk_event(&tx, &turn.user_id, Some(message_id), &turn.assessment)?;
        insert_message(
            &tx,
            &turn.user_id,
            MessageRole::Assistant,
            &turn.assistant_text,
        )?;
        tx.commit()?;
        Ok(message_id)
    }

    fn save_daily_summary(&self, summary: &DailySummary) -> Result<i64, DatabaseError> {
        insert_daily_summary(&*self.conn()?, summary)
    }

    fn get_daily_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, DatabaseError> {
        find_daily_summary(&*self.conn()?, user_id, date)
    }

    fn list_messages(&self, user_id: &str) -> Result<Vec<StoredMessage>, DatabaseError> {
        get_messages_by_user(&*self.conn()?, user_id)
    }

    fn list_risk_events(&self, user_id: &str) -> Result<Vec<StoredRiskEvent>, DatabaseError> {
        get_risk_events_by_user(&*self.conn()?, user_id)
    }
}
