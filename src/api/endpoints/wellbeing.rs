//! Companion chat and daily check-in endpoints.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::wellbeing::{ChatReply, CheckinQuestions, CheckinResult};

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckinQuery {
    pub user_id: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CheckinSubmitRequest {
    pub user_id: String,
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn require_user(user_id: &str) -> Result<&str, ApiError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".into()));
    }
    Ok(user_id)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `POST /mental-health/chat/message`
pub async fn chat_message(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let user_id = require_user(&req.user_id)?;
    let reply = ctx.core.wellbeing.process_message(user_id, &req.message).await?;
    Ok(Json(reply))
}

/// `GET /mental-health/checkin/today?user_id=…`
pub async fn checkin_today(
    State(ctx): State<ApiContext>,
    Query(query): Query<CheckinQuery>,
) -> Result<Json<CheckinQuestions>, ApiError> {
    let user_id = require_user(&query.user_id)?;
    let date = query.date.unwrap_or_else(today);
    Ok(Json(ctx.core.wellbeing.checkin_questions(user_id, date)?))
}

/// `POST /mental-health/checkin/submit`
pub async fn checkin_submit(
    State(ctx): State<ApiContext>,
    Json(req): Json<CheckinSubmitRequest>,
) -> Result<Json<CheckinResult>, ApiError> {
    let user_id = require_user(&req.user_id)?;
    let date = req.date.unwrap_or_else(today);
    let result = ctx
        .core
        .wellbeing
        .submit_checkin(user_id, date, &req.answers)
        .await?;
    Ok(Json(result))
}
