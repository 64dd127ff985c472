use std::io::{self, Write};
use std::time::Duration;

use tokio::time::sleep;

use crate::config::DemoConfig;
use crate::relay::Dispatcher;
use crate::storage::MessageStore;

use super::render::print_messages;

/// Scripted session for non-interactive stdin: a couple of manual sends,
/// a pause so the simulated users get a word in, then the three queries.
pub async fn run_demo<W: Write>(
    out: &mut W,
    store: &MessageStore,
    dispatcher: &Dispatcher,
    timing: &DemoConfig,
) -> io::Result<()> {
    writeln!(
        out,
        "\n[demo mode] Non-interactive environment detected. Running automated demo...\n"
    )?;
    out.flush()?;

    sleep(Duration::from_millis(timing.initial_delay_ms)).await;
    send_scripted(dispatcher, "Eve", "I'll join the meeting in 10 mins.").await;
    sleep(Duration::from_millis(timing.between_sends_ms)).await;
    send_scripted(dispatcher, "Tester", "This is a demo from Tester.").await;
    sleep(Duration::from_millis(timing.settle_delay_ms)).await;

    writeln!(out, "\n--- Full history ---")?;
    print_messages(out, &store.all())?;

    writeln!(out, "\n--- Messages by user: Alice ---")?;
    print_messages(out, &store.filter_by_user("Alice"))?;

    writeln!(out, "\n--- Search keyword: meeting ---")?;
    print_messages(out, &store.search_by_keyword("meeting"))?;

    writeln!(out, "\n[demo mode] Demo complete. Exiting.")?;
    out.flush()
}

async fn send_scripted(dispatcher: &Dispatcher, user_id: &str, text: &str) {
    if let Err(err) = dispatcher.send(user_id, text).await {
        log::warn!("Demo message from {user_id} not sent: {err}");
    }
}
