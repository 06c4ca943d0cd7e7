//! Ordered, append-only conversation transcript.

use crate::message::Message;

/// Messages in display order (oldest first). Entries are never edited or removed
/// individually; `clear` drops the whole transcript.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Most recent bot message that renders buttons.
    pub fn last_with_buttons(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.buttons().is_empty())
    }
}
