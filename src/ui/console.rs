use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::common::{Command, HELP_TEXT};
use crate::relay::Dispatcher;
use crate::storage::MessageStore;

use super::render::{print_messages, print_users};

/// Why the interactive loop returned.
#[derive(Debug)]
pub enum SessionEnd {
    Quit,
    InputClosed,
    ReadFailed(io::Error),
}

/// Interactive prompt: one command per line until EOF, a read error, or `quit`.
///
/// Malformed and unknown commands are reported on `out` and never end the
/// loop. Only a failed write to `out` is returned as an error.
pub async fn run_interactive<R, W>(
    input: R,
    out: &mut W,
    store: &MessageStore,
    dispatcher: &Dispatcher,
    roster: &[String],
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                writeln!(out)?;
                log::debug!("Input closed");
                return Ok(SessionEnd::InputClosed);
            }
            Err(err) => {
                writeln!(out)?;
                log::error!("Failed to read input: {err}");
                return Ok(SessionEnd::ReadFailed(err));
            }
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        match command {
            Command::Quit => {
                writeln!(out, "Exiting chat. Bye!")?;
                return Ok(SessionEnd::Quit);
            }
            Command::Help => writeln!(out, "{HELP_TEXT}")?,
            Command::Send { user_id, text } => {
                if let Err(err) = dispatcher.send(&user_id, &text).await {
                    log::warn!("Dropping message from {user_id}: {err}");
                    writeln!(out, "Could not send message: {err}")?;
                }
            }
            Command::History => print_messages(out, &store.all())?,
            Command::Users => print_users(out, roster, &store.senders())?,
            Command::SearchUser(user_id) => print_messages(out, &store.filter_by_user(&user_id))?,
            Command::SearchKeyword(keyword) => {
                print_messages(out, &store.search_by_keyword(&keyword))?
            }
        }
    }
}
