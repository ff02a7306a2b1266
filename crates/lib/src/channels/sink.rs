//! Reply sink: the outbound side of a channel.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("channel api error: {0}")]
    Api(String),
    #[error("telegram bot token not configured")]
    MissingToken,
}

/// Delivers reply text to a conversation (e.g. a Telegram chat).
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError>;
}
