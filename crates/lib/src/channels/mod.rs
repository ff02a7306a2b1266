//! Communication channels (Telegram).
//!
//! A channel produces [`InboundEvent`]s onto an mpsc queue for the intake loop and
//! accepts replies through [`ReplySink`].

mod inbound;
mod sink;
mod telegram;

pub use inbound::{InboundEvent, Message, Sender};
pub use sink::{ChannelError, ReplySink};
pub use telegram::{BotUser, TelegramChannel, TelegramUpdate};
