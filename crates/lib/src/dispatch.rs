//! Message dispatch: classify one message and produce at most one reply.
//!
//! Commands go to the [`CommandRouter`]; any other non-empty text is a question for the
//! [`Generator`]. Generation failures are logged and the user gets no reply.

use crate::channels::{ChannelError, Message, ReplySink};
use crate::commands::{self, Command, CommandRouter};
use crate::generation::Generator;
use std::sync::Arc;

/// What a dispatch did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No sender; dropped without side effects.
    Discarded,
    /// Unknown command or empty text; nothing sent.
    Ignored,
    /// A command was answered.
    Command(Command),
    /// A generated reply was sent.
    Answered,
    /// Generation failed; nothing sent.
    Suppressed,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("sending reply to chat {chat_id} failed: {source}")]
    Send {
        chat_id: i64,
        #[source]
        source: ChannelError,
    },
}

/// Routes messages to the command router or the generator and sends replies through the sink.
#[derive(Clone)]
pub struct Dispatcher {
    router: CommandRouter,
    generator: Generator,
    sink: Arc<dyn ReplySink>,
}

impl Dispatcher {
    pub fn new(router: CommandRouter, generator: Generator, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            router,
            generator,
            sink,
        }
    }

    /// Handle one message. Replies always go to `message.chat_id`.
    pub async fn dispatch(&self, message: &Message) -> Result<DispatchOutcome, DispatchError> {
        let Some(sender) = &message.sender else {
            return Ok(DispatchOutcome::Discarded);
        };
        let chat_id = message.chat_id;
        let text = message.text.as_str();
        log::info!("{} wrote: {}", sender.first_name, text);

        if commands::is_command(text) {
            let answered = self
                .router
                .handle(self.sink.as_ref(), chat_id, text)
                .await
                .map_err(|source| DispatchError::Send { chat_id, source })?;
            return Ok(answered.map_or(DispatchOutcome::Ignored, DispatchOutcome::Command));
        }

        if text.is_empty() {
            log::debug!("chat {}: ignoring message without text", chat_id);
            return Ok(DispatchOutcome::Ignored);
        }

        let reply = match self.generator.generate(text).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("chat {}: generation failed: {}", chat_id, e);
                return Ok(DispatchOutcome::Suppressed);
            }
        };
        self.sink
            .send_message(chat_id, &reply)
            .await
            .map_err(|source| DispatchError::Send { chat_id, source })?;
        Ok(DispatchOutcome::Answered)
    }
}
