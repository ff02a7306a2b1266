//! Intake loop: the single consumer of inbound events.
//!
//! Events are dispatched one at a time, in arrival order; the next event is not pulled until
//! the current dispatch has finished. Only cancellation stops the loop.

use crate::channels::InboundEvent;
use crate::dispatch::Dispatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Consume `events` until `cancel` fires. Per-event errors are logged and never end the loop.
/// If the source closes first, the loop idles until cancellation.
pub async fn run_intake(
    cancel: CancellationToken,
    mut events: mpsc::Receiver<InboundEvent>,
    dispatcher: Dispatcher,
) {
    log::info!("intake: waiting for updates");
    let mut source_open = true;
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv(), if source_open => event,
        };
        let Some(event) = event else {
            log::warn!("intake: inbound source closed, waiting for shutdown");
            source_open = false;
            continue;
        };
        let Some(message) = event.message else {
            log::debug!("intake: update {} carries no message", event.update_id);
            continue;
        };
        match dispatcher.dispatch(&message).await {
            Ok(outcome) => log::debug!("intake: update {} -> {:?}", event.update_id, outcome),
            Err(e) => log::warn!("intake: update {}: {}", event.update_id, e),
        }
    }
    log::info!("intake: stopped");
}

/// Spawn [`run_intake`] on its own task.
pub fn spawn_intake(
    cancel: CancellationToken,
    events: mpsc::Receiver<InboundEvent>,
    dispatcher: Dispatcher,
) -> JoinHandle<()> {
    tokio::spawn(run_intake(cancel, events, dispatcher))
}
