//! Turn raw reply items into transcript messages.

use crate::api::ReplyItem;
use crate::message::{Message, MessageMetadata, Source};

/// Text of the single message produced for a reply with no items.
pub const EMPTY_REPLY_TEXT: &str = "No recibí respuesta del servidor.";

/// One bot message per item, in arrival order; exactly one fallback message when
/// `items` is empty. Never fails.
pub fn normalize(items: Vec<ReplyItem>) -> Vec<Message> {
    if items.is_empty() {
        log::debug!("empty reply, using fallback message");
        return vec![Message::bot(EMPTY_REPLY_TEXT, None, None)];
    }
    items.into_iter().map(normalize_item).collect()
}

fn normalize_item(item: ReplyItem) -> Message {
    let sources = item.custom.as_ref().and_then(extract_sources);
    let buttons = item.buttons.unwrap_or_default();
    let metadata = MessageMetadata {
        has_buttons: !buttons.is_empty(),
        buttons,
        image: item.image,
        custom: item.custom,
    };
    Message::bot(item.text.unwrap_or_default(), sources, Some(metadata))
}

/// `custom.sources` as a list of sources. Absent or unreadable => None.
fn extract_sources(custom: &crate::message::CustomPayload) -> Option<Vec<Source>> {
    let raw = custom.get("sources")?;
    match serde_json::from_value::<Vec<Source>>(raw.clone()) {
        Ok(sources) => Some(sources),
        Err(e) => {
            log::warn!("ignoring unreadable custom.sources: {}", e);
            None
        }
    }
}
