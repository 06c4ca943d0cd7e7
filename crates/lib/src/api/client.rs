//! HTTP client for the chat orchestrator (http://localhost:8080 by default).
//! One POST per user turn; a GET health probe for liveness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Responder;
use crate::message::{CustomPayload, MessageButton};
use crate::session::SessionStorage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_CHANNEL: &str = "web";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CHAT_PATH: &str = "/api/v1/chat/message";
const HEALTH_PATH: &str = "/api/v1/health";

/// Client for the chat orchestrator HTTP API.
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    channel: String,
    timeout: Duration,
    session: SessionStorage,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("api error: {status} - {reason}")]
    Transport { status: u16, reason: String },
    #[error("request failed: {0}")]
    Connect(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ChatClient {
    pub fn new(base_url: Option<String>, session: SessionStorage) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            channel: DEFAULT_CHANNEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            session,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /api/v1/chat/message: send one user turn; returns the reply items in arrival order.
    /// Creates the session sender id on first use.
    pub async fn send_message(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        let body = ChatRequest {
            sender_id: self.session.sender_id(),
            message: message.to_string(),
            metadata: RequestMetadata {
                channel: self.channel.clone(),
                timestamp: chrono::Utc::now()
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            },
        };
        log::info!("chat request for {} to {}", body.sender_id, url);
        log::debug!("chat message: {}", message);
        let req = self.client.post(&url).json(&body);
        self.execute(req).await
    }

    /// GET /api/v1/health: liveness probe.
    pub async fn check_health(&self) -> Result<HealthResponse, ApiError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        self.execute(self.client.get(&url)).await
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let res = req
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = res.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            log::warn!("api returned {} {}", status.as_u16(), reason);
            return Err(ApiError::Transport {
                status: status.as_u16(),
                reason,
            });
        }
        let text = res.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&text).map_err(|e| {
            log::warn!("could not decode api response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    fn classify(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            log::warn!("api request timed out after {:?}", self.timeout);
            ApiError::Timeout(self.timeout)
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            log::warn!("api request failed: {}", e);
            ApiError::Connect(e.to_string())
        }
    }
}

#[async_trait]
impl Responder for ChatClient {
    async fn reply(&self, text: &str) -> Result<Vec<ReplyItem>, ApiError> {
        Ok(self.send_message(text).await?.messages)
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub sender_id: String,
    pub message: String,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub channel: String,
    /// ISO 8601, UTC.
    pub timestamp: String,
}

/// Chat reply envelope. A missing `messages` array is treated as an empty reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub messages: Vec<ReplyItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One part of a multi-part bot reply, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<MessageButton>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub database_status: String,
}
