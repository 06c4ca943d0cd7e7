//! Responder abstraction and the chat orchestrator HTTP client.
//!
//! A responder turns one user input into the backend's raw reply items; the remote
//! client and the offline keyword responder both implement it.

mod client;

use async_trait::async_trait;

pub use client::{
    ApiError, ChatClient, ChatRequest, ChatResponse, HealthResponse, ReplyItem, RequestMetadata,
    DEFAULT_BASE_URL, DEFAULT_CHANNEL, DEFAULT_TIMEOUT,
};

/// Produces reply items for one user turn.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, text: &str) -> Result<Vec<ReplyItem>, ApiError>;

    /// Where replies come from, for diagnostics shown to the user.
    fn endpoint(&self) -> String;
}
