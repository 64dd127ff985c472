pub mod sender;

pub use sender::{SimulatedUser, StopSignal};

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::relay::Dispatcher;

/// Start every user on the shared stop signal.
pub fn spawn_all(
    users: Vec<SimulatedUser>,
    dispatcher: &Arc<Dispatcher>,
    stop: &StopSignal,
) -> Vec<JoinHandle<()>> {
    users
        .into_iter()
        .map(|user| {
            log::info!("Starting simulated user {}", user.name);
            user.spawn(Arc::clone(dispatcher), stop.subscribe())
        })
        .collect()
}
