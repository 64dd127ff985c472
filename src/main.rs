mod common;
mod config;
mod relay;
mod simulator;
mod storage;
mod ui;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use relay::{ConsoleBroadcast, Dispatcher};
use simulator::StopSignal;
use storage::MessageStore;

#[derive(Parser)]
#[command(
    name = "relay_chat",
    version,
    about = "In-memory chat simulator with a serialized dispatcher"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// How to drive the session; `auto` picks by whether stdin is a terminal
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,
    /// Do not start the simulated users
    #[arg(long)]
    no_simulation: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Auto,
    Interactive,
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    println!("{}", ui::BANNER);
    println!("Type 'help' for commands (in interactive terminals).");

    let store = Arc::new(MessageStore::new());
    let dispatcher = Arc::new(Dispatcher::with_capacity(
        Arc::clone(&store),
        Arc::new(ConsoleBroadcast),
        app_config.queue_capacity,
    ));
    dispatcher.start()?;

    let stop = StopSignal::new();
    let senders = if cli.no_simulation {
        Vec::new()
    } else {
        simulator::spawn_all(app_config.enabled_users(), &dispatcher, &stop)
    };

    dispatcher.send("System", &app_config.welcome_message).await?;

    let interactive = match cli.mode {
        Mode::Auto => io::stdin().is_terminal(),
        Mode::Interactive => true,
        Mode::Demo => false,
    };
    log::info!(
        "Running in {} mode with {} simulated user(s)",
        if interactive { "interactive" } else { "demo" },
        senders.len()
    );

    let mut stdout = io::stdout();
    let session = if interactive {
        let roster: Vec<String> = app_config
            .simulated_users
            .iter()
            .map(|user| user.name.clone())
            .collect();
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        ui::run_interactive(stdin, &mut stdout, &store, &dispatcher, &roster)
            .await
            .map(report_session_end)
    } else {
        ui::run_demo(&mut stdout, &store, &dispatcher, &app_config.demo).await
    };

    stop.stop();
    dispatcher.stop();
    for sender in senders {
        if let Err(err) = sender.await {
            log::error!("Simulated user task failed: {err}");
        }
    }
    if store.is_empty() {
        log::warn!("Session ended with an empty history");
    } else {
        log::info!("Final history: {} message(s)", store.len());
    }

    session?;
    Ok(())
}

// Shown regardless of RUST_LOG; stdout stays reserved for chat output.
fn report_session_end(end: ui::SessionEnd) {
    match end {
        ui::SessionEnd::Quit => {}
        ui::SessionEnd::InputClosed => eprintln!("\n[info] input closed (EOF). Exiting."),
        ui::SessionEnd::ReadFailed(err) => eprintln!("\n[error] failed to read input: {err}"),
    }
}
