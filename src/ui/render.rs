use std::collections::HashSet;
use std::io::{self, Write};

use crate::common::Message;

pub const BANNER: &str = "=== Simple Text-Based Chat (Rust) ===";

/// `#<id> [<YYYY-MM-DD HH:MM:SS>] <userID>: <text>`
pub fn history_line(message: &Message) -> String {
    format!(
        "#{} [{}] {}: {}",
        message.id,
        message.formatted_timestamp(),
        message.user_id,
        message.text
    )
}

pub fn print_messages<W: Write>(out: &mut W, messages: &[Message]) -> io::Result<()> {
    if messages.is_empty() {
        return writeln!(out, "No messages found.");
    }
    for message in messages {
        writeln!(out, "{}", history_line(message))?;
    }
    Ok(())
}

/// Roster names first, then anyone else who has posted, each listed once.
pub fn print_users<W: Write>(
    out: &mut W,
    roster: &[String],
    senders: &[String],
) -> io::Result<()> {
    let mut seen = HashSet::new();
    let listed: Vec<&String> = roster
        .iter()
        .chain(senders)
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();

    if listed.is_empty() {
        return writeln!(out, "No users found.");
    }
    writeln!(out, "Users:")?;
    for name in listed {
        writeln!(out, "  {name}")?;
    }
    Ok(())
}
