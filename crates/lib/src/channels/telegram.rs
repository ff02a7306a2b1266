//! Telegram channel: long-poll getUpdates and sendMessage via Bot API.

use crate::channels::inbound::{InboundEvent, Message, Sender};
use crate::channels::sink::{ChannelError, ReplySink};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Bot API envelope: `{ "ok": true, "result": ... }` or `{ "ok": false, "description": ... }`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Identity of the bot itself, as returned by getMe.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<TelegramUpdate> for InboundEvent {
    fn from(update: TelegramUpdate) -> Self {
        let message = update.message.map(|m| Message {
            chat_id: m.chat.id,
            sender: m.from.map(|u| Sender {
                id: u.id,
                first_name: u.first_name,
                username: u.username,
            }),
            text: m.text.unwrap_or_default(),
        });
        InboundEvent {
            update_id: update.update_id,
            message,
        }
    }
}

/// Telegram channel connector: long-polls for updates and sends replies via sendMessage.
pub struct TelegramChannel {
    api_base: String,
    token: Option<String>,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>, config: &TelegramConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            poll_timeout_secs: config.poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> Result<String, ChannelError> {
        let token = self.token.as_ref().ok_or(ChannelError::MissingToken)?;
        Ok(format!("{}/bot{}/{}", self.api_base, token, method))
    }

    /// Unwrap the Bot API envelope, turning HTTP failures and `ok: false` into `ChannelError::Api`.
    async fn read_response<T: DeserializeOwned>(
        method: &str,
        res: reqwest::Response,
    ) -> Result<T, ChannelError> {
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("{} failed: {} {}", method, status, body)));
        }
        let data: ApiResponse<T> = res.json().await?;
        if !data.ok {
            return Err(ChannelError::Api(format!(
                "{} returned ok: false ({})",
                method,
                data.description.unwrap_or_default()
            )));
        }
        data.result
            .ok_or_else(|| ChannelError::Api(format!("{} returned no result", method)))
    }

    /// Call getMe: verifies the token and returns the bot identity.
    pub async fn get_me(&self) -> Result<BotUser, ChannelError> {
        let url = self.method_url("getMe")?;
        let res = self.client.get(&url).send().await?;
        Self::read_response("getMe", res).await
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    /// The next offset acknowledges every returned update so none is delivered twice.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), ChannelError> {
        let url = self.method_url("getUpdates")?;
        let mut query = vec![("timeout", self.poll_timeout_secs.to_string())];
        if let Some(off) = offset {
            query.push(("offset", off.to_string()));
        }
        let res = self.client.get(&url).query(&query).send().await?;
        let updates: Vec<TelegramUpdate> = Self::read_response("getUpdates", res).await?;
        let next_offset = updates
            .iter()
            .map(|u| u.update_id)
            .max()
            .map(|id| id + 1)
            .or(offset);
        Ok((updates, next_offset))
    }

    /// Send a text message to a chat via sendMessage API.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let url = self.method_url("sendMessage")?;
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        let res = self.client.post(&url).json(&body).send().await?;
        let _: serde_json::Value = Self::read_response("sendMessage", res).await?;
        Ok(())
    }

    /// Start the getUpdates long-poll loop and forward events in arrival order.
    /// Runs until `cancel` fires or the receiver is dropped.
    pub fn start_inbound(
        self: Arc<Self>,
        inbound_tx: mpsc::Sender<InboundEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx, cancel).await;
        })
    }
}

async fn run_get_updates_loop(
    channel: Arc<TelegramChannel>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    cancel: CancellationToken,
) {
    let mut offset: Option<i64> = None;
    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            res = channel.get_updates(offset) => res,
        };
        match polled {
            Ok((updates, next)) => {
                for u in updates {
                    if inbound_tx.send(InboundEvent::from(u)).await.is_err() {
                        log::debug!("telegram: inbound channel closed, stopping loop");
                        return;
                    }
                }
                offset = next;
            }
            Err(e) => {
                log::warn!("telegram getUpdates error: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                }
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}

#[async_trait]
impl ReplySink for TelegramChannel {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        TelegramChannel::send_message(self, chat_id, text).await
    }
}
