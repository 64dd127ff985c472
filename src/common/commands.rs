use thiserror::Error;

/// A command typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Enqueue a message as `user_id`.
    Send {
        user_id: String,
        text: String,
    },
    History,
    /// List the simulated roster plus everyone who has posted.
    Users,
    SearchUser(String),
    SearchKeyword(String),
    Quit,
}

/// Rejected input. The `Display` text is what the prompt prints back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: send <UserID> <message...>")]
    SendUsage,
    #[error("Usage: search user <UserID>  OR  search keyword <word>")]
    SearchUsage,
    #[error("Unknown search subcommand. Use: user OR keyword")]
    UnknownSearch,
    #[error("Unknown command. Type 'help' for commands.")]
    Unknown,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            return Ok(None);
        };

        let command = match keyword.to_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            "history" => Command::History,
            "users" => Command::Users,
            "send" => {
                if parts.len() < 3 {
                    return Err(CommandError::SendUsage);
                }
                Command::Send {
                    user_id: parts[1].to_string(),
                    text: parts[2..].join(" "),
                }
            }
            "search" => {
                if parts.len() < 3 {
                    return Err(CommandError::SearchUsage);
                }
                let argument = parts[2..].join(" ");
                match parts[1].to_lowercase().as_str() {
                    "user" => Command::SearchUser(argument),
                    "keyword" => Command::SearchKeyword(argument),
                    _ => return Err(CommandError::UnknownSearch),
                }
            }
            _ => return Err(CommandError::Unknown),
        };

        Ok(Some(command))
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  send <UserID> <message...>  - send a message as UserID
  history                     - show all messages
  users                       - list simulated users and everyone who posted
  search user <UserID>        - show messages by a user
  search keyword <word>       - search messages by keyword
  help                        - show this help
  quit / exit                 - exit the program";
