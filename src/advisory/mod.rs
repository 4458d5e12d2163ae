//! External advisory collaborator.
//!
//! The language-model service is a black box: it either returns a
//! structured opinion or fails. Every failure (not configured, connection,
//! timeout, HTTP status, unparseable body) degrades to a fixed fallback
//! payload inside [`AdvisoryService`]; callers never see an error.

pub mod client;
pub mod fallback;
pub mod parser;
pub mod service;

pub use client::{MockAdvisoryClient, OpenAiCompatClient};
pub use service::{AdvisoryOutcome, AdvisoryService};

use async_trait::async_trait;
use serde::Serialize;

use crate::models::RiskLevel;
use crate::risk::ExternalSignal;

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("Advisory service is not configured (no API key)")]
    NotConfigured,

    #[error("Cannot reach advisory service: {0}")]
    Connection(String),

    #[error("Advisory call timed out after {0}s")]
    Timeout(u64),

    #[error("Advisory service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed advisory response: {0}")]
    MalformedResponse(String),
}

/// A raw chat-completion backend. Implementations only move text; parsing
/// and fallback live in [`AdvisoryService`].
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, AdvisoryError>;
}

/// Structured opinion on a single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvisoryOpinion {
    pub risk_level: RiskLevel,
    pub self_harm_detected: bool,
    pub reply: String,
    pub advice: Vec<String>,
}

impl AdvisoryOpinion {
    pub fn signal(&self) -> ExternalSignal {
        ExternalSignal {
            risk_level: self.risk_level,
            self_harm_detected: self.self_harm_detected,
        }
    }
}

/// Structured summary of a daily check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinSummary {
    pub daily_summary: String,
    pub risk_level: RiskLevel,
    pub self_harm_detected: bool,
    pub advice: Vec<String>,
    pub reply: String,
}

impl CheckinSummary {
    pub fn signal(&self) -> ExternalSignal {
        ExternalSignal {
            risk_level: self.risk_level,
            self_harm_detected: self.self_harm_detected,
        }
    }
}
