//! Transcript message model: messages, legal citations, and display metadata.
//!
//! Bot messages are built by the normalizer (or the local responder); user messages
//! come straight from typed input, suggestion chips, or button payloads.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Opaque backend payload carried through untouched (`custom` on a reply item).
pub type CustomPayload = serde_json::Map<String, serde_json::Value>;

/// Legal reference attached to a bot message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub article: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub law: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Reserved for a retrieval backend; not populated by the chat endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Reserved for a retrieval backend; not populated by the chat endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
}

/// `null` reads as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Source {
    pub fn new(
        article: impl Into<String>,
        law: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            article: article.into(),
            law: law.into(),
            description: description.into(),
            similarity_score: None,
            content_snippet: None,
        }
    }
}

/// Interactive button on a bot message; clicking it sends `payload` as user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageButton {
    pub title: String,
    pub payload: String,
}

/// Display hints for a bot message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub has_buttons: bool,
    #[serde(default)]
    pub buttons: Vec<MessageButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomPayload>,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, false, None, None)
    }

    pub fn bot(
        text: impl Into<String>,
        sources: Option<Vec<Source>>,
        metadata: Option<MessageMetadata>,
    ) -> Self {
        Self::new(text, true, sources, metadata)
    }

    fn new(
        text: impl Into<String>,
        is_bot: bool,
        sources: Option<Vec<Source>>,
        metadata: Option<MessageMetadata>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            text: text.into(),
            is_bot,
            timestamp: Utc::now(),
            sources,
            metadata,
        }
    }

    /// First attached source, which is the one shown as the citation.
    pub fn citation(&self) -> Option<&Source> {
        self.sources.as_deref().and_then(|s| s.first())
    }

    /// Buttons to render: only bot messages flagged `hasButtons` show them.
    pub fn buttons(&self) -> &[MessageButton] {
        match &self.metadata {
            Some(m) if self.is_bot && m.has_buttons => &m.buttons,
            _ => &[],
        }
    }

    /// Image to render (bot messages only).
    pub fn image(&self) -> Option<&str> {
        if !self.is_bot {
            return None;
        }
        self.metadata.as_ref().and_then(|m| m.image.as_deref())
    }

    /// Creation time as local `HH:MM`.
    pub fn time_label(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}
