//! Slash commands: a closed set of literal tokens answered with canned text.

use crate::channels::{ChannelError, ReplySink};
use crate::config::RepliesConfig;

/// Prefix that marks a message as a command rather than a question.
pub const COMMAND_PREFIX: char = '/';

/// Recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    About,
}

impl Command {
    /// Parse the token before the first whitespace. `None` when the text is not a command
    /// or the command is not one we know.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        match token {
            "/start" => Some(Command::Start),
            "/about" => Some(Command::About),
            _ => None,
        }
    }
}

/// True when the text should be routed to the command router.
pub fn is_command(text: &str) -> bool {
    text.starts_with(COMMAND_PREFIX)
}

/// Maps commands to their canned replies and sends them.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    replies: RepliesConfig,
}

impl CommandRouter {
    pub fn new(replies: RepliesConfig) -> Self {
        Self { replies }
    }

    pub fn reply_for(&self, command: Command) -> &str {
        match command {
            Command::Start => &self.replies.greeting,
            Command::About => &self.replies.about,
        }
    }

    /// Answer a command. Returns the command that was answered, or `None` for an unknown
    /// command (nothing is sent). Send failures are returned to the caller.
    pub async fn handle(
        &self,
        sink: &dyn ReplySink,
        chat_id: i64,
        text: &str,
    ) -> Result<Option<Command>, ChannelError> {
        let Some(command) = Command::parse(text) else {
            log::debug!("ignoring unknown command {:?}", text);
            return Ok(None);
        };
        sink.send_message(chat_id, self.reply_for(command)).await?;
        Ok(Some(command))
    }
}
