//! Bot runner: wires the Telegram poller, the intake loop and the Ollama backend together.
//!
//! The poller produces events onto an mpsc queue; one intake task consumes them. A single
//! cancellation token, fired once on shutdown, stops both.

use crate::channels::{BotUser, TelegramChannel};
use crate::commands::CommandRouter;
use crate::config::{self, Config};
use crate::dispatch::Dispatcher;
use crate::generation::Generator;
use crate::intake;
use crate::llm::OllamaClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const INBOUND_QUEUE_CAPACITY: usize = 64;

/// A started bot. Call [`RunningBot::shutdown`] to stop it.
pub struct RunningBot {
    pub bot_user: BotUser,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningBot {
    /// Token that stops the poller and the intake loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fire cancellation and wait for the poller and intake tasks. An in-flight dispatch
    /// finishes before the intake task exits.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for h in self.tasks {
            if let Err(e) = h.await {
                log::warn!("bot task ended abnormally: {}", e);
            }
        }
        log::info!("bot stopped");
    }
}

/// Verify the Telegram token, then spawn the poller and the intake task.
pub async fn start_bot(config: Config) -> Result<RunningBot> {
    let token = config::resolve_telegram_token(&config).context(
        "telegram bot token not configured (set telegram.botToken, TELEGRAM_BOT_TOKEN or TG_TOKEN)",
    )?;
    let telegram = Arc::new(TelegramChannel::new(Some(token), &config.telegram));
    let bot_user = telegram
        .get_me()
        .await
        .context("connecting to telegram (getMe)")?;
    log::info!(
        "authorized as @{} (id {})",
        bot_user.username.as_deref().unwrap_or(&bot_user.first_name),
        bot_user.id
    );

    let ollama = OllamaClient::new(Some(config.ollama.base_url.clone()));
    spawn_model_check(ollama.clone(), config.ollama.model.clone());

    let generator = Generator::new(Arc::new(ollama), config.ollama.model.clone())
        .with_timeout(config.ollama.request_timeout());
    let dispatcher = Dispatcher::new(
        CommandRouter::new(config.replies.clone()),
        generator,
        telegram.clone(),
    );

    let cancel = CancellationToken::new();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let poller = telegram.start_inbound(inbound_tx, cancel.clone());
    let consumer = intake::spawn_intake(cancel.clone(), inbound_rx, dispatcher);

    Ok(RunningBot {
        bot_user,
        cancel,
        tasks: vec![poller, consumer],
    })
}

/// Run the bot until a newline on stdin, Ctrl+C or SIGTERM.
pub async fn run_bot(config: Config) -> Result<()> {
    let bot = start_bot(config).await?;
    println!("waiting for updates; press Enter to stop");
    shutdown_signal().await;
    log::info!("shutdown signal received, stopping bot");
    bot.shutdown().await;
    Ok(())
}

/// Warn early when the configured model is not available on the Ollama host.
fn spawn_model_check(ollama: OllamaClient, model: String) {
    tokio::spawn(async move {
        match ollama.list_models().await {
            Ok(models) => {
                if models.iter().any(|m| m.name == model) {
                    log::info!("ollama model {} available at {}", model, ollama.base_url());
                } else {
                    log::warn!(
                        "ollama model {} not found at {} (run `ollama pull {}`)",
                        model,
                        ollama.base_url(),
                        model
                    );
                }
            }
            Err(e) => {
                log::warn!("ollama model discovery failed: {}", e);
            }
        }
    });
}

/// Future that completes when the process should shut down: a line on stdin, Ctrl+C or SIGTERM.
/// Stdin at EOF (e.g. running detached) does not trigger shutdown.
async fn shutdown_signal() {
    let stdin_line = async {
        let mut line = String::new();
        let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(n) if n > 0 => {}
            _ => std::future::pending::<()>().await,
        }
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = stdin_line => {},
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
