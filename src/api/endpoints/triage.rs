//! Symptom triage endpoints.
//!
//! - `POST /diagnostics/triage/text`: start or continue with free text
//! - `POST /diagnostics/triage/image`: multipart image upload
//! - `POST /diagnostics/triage/session/:id/text`: add text to a session
//! - `POST /diagnostics/triage/session/:id/answer`: answer the pending question
//! - `POST /diagnostics/triage/session/:id/finalize`: close the session
//! - `GET /diagnostics/triage/session/:id`: session snapshot

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::engine::{SessionSnapshot, TextInput, TriageInput, TriageResponse};
use crate::observation::detect_image_format;

#[derive(Debug, Deserialize)]
pub struct TextTriageRequest {
    pub symptoms: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl TextTriageRequest {
    fn into_parts(self) -> (Option<String>, TextInput) {
        let text = TextInput {
            symptoms: self.symptoms,
            severity: self.severity,
            duration: self.duration,
        };
        (self.session_id.filter(|id| !id.trim().is_empty()), text)
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionTextRequest {
    pub symptoms: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer: String,
}

/// `POST /diagnostics/triage/text`
pub async fn start_text(
    State(ctx): State<ApiContext>,
    Json(req): Json<TextTriageRequest>,
) -> Result<Json<TriageResponse>, ApiError> {
    let (session_id, text) = req.into_parts();
    let response = ctx
        .core
        .engine
        .start_or_continue(session_id.as_deref(), TriageInput::Text(text))
        .await?;
    Ok(Json(response))
}

/// `POST /diagnostics/triage/image`
///
/// Fields: `file` (required, `image/*`), `session_id` and `symptoms` (optional).
/// An upload with symptoms is treated as mixed input.
pub async fn start_image(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<TriageResponse>, ApiError> {
    let max_bytes = ctx.core.settings.max_image_bytes;
    let mut image: Option<Vec<u8>> = None;
    let mut session_id: Option<String> = None;
    let mut symptoms: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(ApiError::BadRequest("File must be an image".into()));
                }
                let bytes = field.bytes().await?;
                if bytes.len() > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "Image exceeds the {max_bytes} byte limit"
                    )));
                }
                if detect_image_format(&bytes).is_none() {
                    return Err(ApiError::BadRequest("Unrecognised image format".into()));
                }
                image = Some(bytes.to_vec());
            }
            Some("session_id") => session_id = Some(field.text().await?),
            Some("symptoms") => symptoms = Some(field.text().await?),
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".into()))?;
    let session_id = session_id.filter(|id| !id.trim().is_empty());
    let input = match symptoms.filter(|s| !s.trim().is_empty()) {
        Some(symptoms) => TriageInput::Mixed {
            text: TextInput::new(symptoms),
            image,
        },
        None => TriageInput::Image(image),
    };

    let response = ctx
        .core
        .engine
        .start_or_continue(session_id.as_deref(), input)
        .await?;
    Ok(Json(response))
}

/// `POST /diagnostics/triage/session/:id/text`
pub async fn add_text(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
    Json(req): Json<SessionTextRequest>,
) -> Result<Json<TriageResponse>, ApiError> {
    let text = TextInput {
        symptoms: req.symptoms,
        severity: req.severity,
        duration: req.duration,
    };
    let response = ctx
        .core
        .engine
        .start_or_continue(Some(&session_id), TriageInput::Text(text))
        .await?;
    Ok(Json(response))
}

/// `POST /diagnostics/triage/session/:id/answer`
pub async fn answer(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<TriageResponse>, ApiError> {
    let response = ctx
        .core
        .engine
        .submit_answer(&session_id, &req.question_id, &req.answer)
        .await?;
    Ok(Json(response))
}

/// `POST /diagnostics/triage/session/:id/finalize`
pub async fn finalize(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
) -> Result<Json<TriageResponse>, ApiError> {
    Ok(Json(ctx.core.engine.finalize(&session_id).await?))
}

/// `GET /diagnostics/triage/session/:id`
pub async fn get_session(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(ctx.core.engine.get_session(&session_id)?))
}
