use chrono::{DateTime, Local};

/// Timestamp layout shared by the broadcast line and history listings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single chat message as stored in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub user_id: String,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A send request waiting in the dispatcher queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub user_id: String,
    pub text: String,
}

impl MessageInput {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}
