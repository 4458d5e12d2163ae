//! Image-observation collaborator.
//!
//! Turns image bytes into a set of observation tags. The upstream model is
//! opaque; any failure is absorbed into "no observations".

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::VisionSettings;
use crate::triage::signals::keyword_positions;

#[derive(Debug, thiserror::Error)]
pub enum ObservationError {
    #[error("Vision service is not configured")]
    NotConfigured,

    #[error("Cannot reach vision service: {0}")]
    Connection(String),

    #[error("Vision service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed vision response: {0}")]
    MalformedResponse(String),
}

/// Tags the vision model is asked to choose from.
pub const OBSERVATION_VOCABULARY: &[&str] = &[
    "open wound",
    "bleeding",
    "redness",
    "rash",
    "swelling",
    "bruise",
    "blister",
    "scab",
];

#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn extract_observations(&self, image: &[u8])
        -> Result<BTreeSet<String>, ObservationError>;
}

/// Run a source and collapse errors into an empty set.
pub async fn observe(source: &dyn ObservationSource, image: &[u8]) -> BTreeSet<String> {
    match source.extract_observations(image).await {
        Ok(tags) => {
            tracing::debug!(count = tags.len(), "Image observations extracted");
            tags
        }
        Err(ObservationError::NotConfigured) => BTreeSet::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Observation extraction failed, treating as no observations");
            BTreeSet::new()
        }
    }
}

/// Build the configured source: Ollama vision when a URL is set, otherwise none.
pub fn from_settings(settings: &VisionSettings) -> Arc<dyn ObservationSource> {
    match settings.base_url.as_deref() {
        Some(url) => match OllamaVisionSource::new(url, &settings.model, settings.timeout) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                tracing::warn!(error = %e, "Vision client unavailable, image observations disabled");
                Arc::new(NoObservations)
            }
        },
        None => Arc::new(NoObservations),
    }
}

// ── Image format check ──────────────────────────────────────

/// Detect a supported raster image format from magic bytes.
pub fn detect_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some("jpeg")
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
    {
        Some("png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else if bytes.len() >= 6 && (&bytes[0..6] == b"GIF87a" || &bytes[0..6] == b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        Some("heic")
    } else {
        None
    }
}

// ── Ollama vision ───────────────────────────────────────────

const VISION_PROMPT: &str = "Look at this photo of a body part. List only the visible findings \
from this set, comma-separated: open wound, bleeding, redness, rash, swelling, bruise, blister, scab. \
Reply with 'none' if nothing applies.";

pub struct OllamaVisionSource {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaVisionSource {
    pub fn new(
        base_url: &str,
        model: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, ObservationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ObservationError::Connection(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl ObservationSource for OllamaVisionSource {
    async fn extract_observations(
        &self,
        image: &[u8],
    ) -> Result<BTreeSet<String>, ObservationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: VISION_PROMPT,
            images: vec![base64::engine::general_purpose::STANDARD.encode(image)],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ObservationError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ObservationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ObservationError::MalformedResponse(e.to_string()))?;

        Ok(tags_from_text(&parsed.response))
    }
}

/// Words that cancel a finding named shortly after them in the same clause.
const NEGATIONS: &[&str] = &["no", "not", "without", "none", "absent", "never", "don't", "isn't"];

/// How many words before a finding are searched for a negation.
const NEGATION_WINDOW: usize = 3;

/// Keep only vocabulary terms the model's free-text reply asserts.
/// "no open wound" or "redness, without bleeding" do not count.
pub fn tags_from_text(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    OBSERVATION_VOCABULARY
        .iter()
        .filter(|tag| keyword_positions(&lower, tag).any(|idx| !is_negated(&lower[..idx])))
        .map(|tag| tag.to_string())
        .collect()
}

fn is_negated(before: &str) -> bool {
    let clause = before
        .rsplit(|c: char| matches!(c, ',' | ';' | '.' | ':' | '\n'))
        .next()
        .unwrap_or(before);
    clause
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .rev()
        .take(NEGATION_WINDOW)
        .any(|w| NEGATIONS.contains(&w))
}

// ── Fixed sources ───────────────────────────────────────────

/// Source used when no vision endpoint is configured.
pub struct NoObservations;

#[async_trait]
impl ObservationSource for NoObservations {
    async fn extract_observations(
        &self,
        _image: &[u8],
    ) -> Result<BTreeSet<String>, ObservationError> {
        Err(ObservationError::NotConfigured)
    }
}

/// Returns the same tags for every image.
pub struct StaticObservations {
    tags: BTreeSet<String>,
}

impl StaticObservations {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ObservationSource for StaticObservations {
    async fn extract_observations(
        &self,
        _image: &[u8],
    ) -> Result<BTreeSet<String>, ObservationError> {
        Ok(self.tags.clone())
    }
}
