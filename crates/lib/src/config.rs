//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.llamagram/config.json`) and environment.
//! Built once at startup and handed to the bot, dispatcher and intake loop; never mutated afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Ollama backend settings (base URL, model).
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Canned replies for the built-in commands.
    #[serde(default)]
    pub replies: RepliesConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN (or TG_TOKEN) env when set.
    pub bot_token: Option<String>,

    /// Bot API base URL (default "https://api.telegram.org").
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// getUpdates long-poll timeout in seconds (default 60).
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    60
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// Ollama backend config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API (default "http://localhost:11434").
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model used for every generation request: the exact name from `ollama list` (e.g. "llama3.1:8b").
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional deadline for one generation request. Unset means wait for the backend indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_model(),
            request_timeout_secs: None,
        }
    }
}

impl OllamaConfig {
    /// Generation deadline, if configured. Zero is treated as unset.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

/// Texts sent in response to `/start` and `/about`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,

    #[serde(default = "default_about")]
    pub about: String,
}

fn default_greeting() -> String {
    "Hi, welcome! Ask me anything and I will do my best to find you an answer.".to_string()
}

fn default_about() -> String {
    "A small Telegram bot with a local llama3.1:8b model under the hood that answers your questions."
        .to_string()
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            about: default_about(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN, then TG_TOKEN, override config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    non_empty_env("TELEGRAM_BOT_TOKEN")
        .or_else(|| non_empty_env("TG_TOKEN"))
        .or_else(|| {
            config
                .telegram
                .bot_token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("LLAMAGRAM_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".llamagram").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
