use crate::common::Message;

/// Delivery side of the dispatcher: called once for every stored message.
pub trait Broadcast: Send + Sync {
    fn broadcast(&self, message: &Message);
}

/// Prints each delivered message to stdout, standing in for client fan-out.
pub struct ConsoleBroadcast;

impl Broadcast for ConsoleBroadcast {
    fn broadcast(&self, message: &Message) {
        println!("{}", broadcast_line(message));
    }
}

/// `[<YYYY-MM-DD HH:MM:SS>] <userID>: <text>`
pub fn broadcast_line(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.formatted_timestamp(),
        message.user_id,
        message.text
    )
}
