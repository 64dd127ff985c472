pub mod broadcast;
pub mod dispatcher;

pub use broadcast::ConsoleBroadcast;
pub use dispatcher::{DEFAULT_QUEUE_CAPACITY, Dispatcher};
