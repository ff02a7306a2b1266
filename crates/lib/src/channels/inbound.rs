//! Inbound events from a channel: delivered in order to the intake loop.

/// One update from the transport. Not every update carries a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// A user message. `sender` is `None` when the transport did not identify the author
/// (e.g. channel posts); such messages are discarded by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub chat_id: i64,
    pub sender: Option<Sender>,
    /// Message text; empty when the message has no text (stickers, photos, ...).
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}
