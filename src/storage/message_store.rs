use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;

use crate::common::Message;

struct History {
    messages: Vec<Message>,
    next_id: u64,
}

/// Append-only chat history shared between the dispatcher and readers.
///
/// Writers take the exclusive lock, the read queries share it. Every read
/// returns owned copies, so callers never observe later appends.
pub struct MessageStore {
    history: RwLock<History>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            history: RwLock::new(History {
                messages: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Append a message stamped with the current local time.
    pub fn add(&self, user_id: &str, text: &str) -> Message {
        let mut history = self.write();
        let id = history.next_id;
        history.next_id += 1;

        let message = Message {
            id,
            user_id: user_id.to_string(),
            text: text.to_string(),
            timestamp: Local::now(),
        };
        history.messages.push(message.clone());
        message
    }

    pub fn all(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    /// Messages whose author matches `user_id`, ignoring case.
    pub fn filter_by_user(&self, user_id: &str) -> Vec<Message> {
        let wanted = user_id.to_lowercase();
        self.read()
            .messages
            .iter()
            .filter(|message| message.user_id.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    /// Messages whose text contains `keyword`, ignoring case.
    pub fn search_by_keyword(&self, keyword: &str) -> Vec<Message> {
        let needle = keyword.to_lowercase();
        self.read()
            .messages
            .iter()
            .filter(|message| message.text.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Distinct authors in order of their first message. Names that differ
    /// only by case count once, keeping the first spelling seen.
    pub fn senders(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.read()
            .messages
            .iter()
            .filter(|message| seen.insert(message.user_id.to_lowercase()))
            .map(|message| message.user_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The id is claimed before the push, so a writer that panicked can at
    // worst leave a gap; ids stay unique and the history stays readable.
    fn read(&self) -> RwLockReadGuard<'_, History> {
        self.history.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, History> {
        self.history.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
