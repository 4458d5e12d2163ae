use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AdvisoryClient, AdvisoryError};
use crate::config::AdvisorySettings;

const TEMPERATURE: f32 = 0.4;

/// OpenAI-compatible `/chat/completions` client (Groq by default).
pub struct OpenAiCompatClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiCompatClient {
    pub fn new(settings: &AdvisorySettings) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AdvisoryError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            client,
            timeout_secs: settings.timeout.as_secs(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl AdvisoryClient for OpenAiCompatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, AdvisoryError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisoryError::NotConfigured)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisoryError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AdvisoryError::Connection(self.base_url.clone())
                } else {
                    AdvisoryError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdvisoryError::MalformedResponse("No completion choices".into()))
    }
}

/// In-memory advisory backend. Replies are served in order; the last one
/// repeats once the queue is down to a single entry.
pub struct MockAdvisoryClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    delay: Option<Duration>,
}

impl MockAdvisoryClient {
    pub fn new(response: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Ok(response.to_string())])),
            delay: None,
        }
    }

    /// A backend that always fails with a connection error.
    pub fn failing(reason: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(reason.to_string())])),
            delay: None,
        }
    }

    pub fn then(self, response: &str) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(Ok(response.to_string()));
        }
        self
    }

    /// Sleep before answering, to exercise the service timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AdvisoryClient for MockAdvisoryClient {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, AdvisoryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = {
            let mut queue = self
                .replies
                .lock()
                .map_err(|_| AdvisoryError::Connection("mock poisoned".into()))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(AdvisoryError::Connection(reason)),
            None => Err(AdvisoryError::NotConfigured),
        }
    }
}
