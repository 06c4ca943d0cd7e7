//! Session-scoped key/value storage and the chat sender id.
//!
//! One `SessionStorage` lives for the duration of an interactive session. Front-ends
//! create it at startup and call `clear` before first use, so the sender id is never
//! carried over from an earlier run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Storage key under which the sender id is kept.
pub const SENDER_ID_KEY: &str = "chat_sender_id";

const SENDER_ID_RANDOM_LEN: usize = 9;

/// In-memory, session-scoped storage shared by the UI and the API client.
#[derive(Clone, Default)]
pub struct SessionStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok().and_then(|g| g.get(key).cloned())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut g) = self.inner.lock() {
            g.insert(key.into(), value.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.inner.lock() {
            g.clear();
        }
    }

    /// Return the sender id, creating and storing one on first use.
    pub fn sender_id(&self) -> String {
        let mut g = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.entry(SENDER_ID_KEY.to_string())
            .or_insert_with(generate_sender_id)
            .clone()
    }
}

/// `user_` + random base36 characters + current epoch milliseconds.
fn generate_sender_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let id = format!("user_{}{}", random_base36(SENDER_ID_RANDOM_LEN), millis);
    log::debug!("created sender id {}", id);
    id
}

fn random_base36(len: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n = uuid::Uuid::new_v4().as_u128();
    (0..len)
        .map(|_| {
            let c = DIGITS[(n % 36) as usize] as char;
            n /= 36;
            c
        })
        .collect()
}
