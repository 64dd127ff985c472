pub mod commands;
pub mod types;

pub use commands::{Command, HELP_TEXT};
pub use types::{Message, MessageInput};
