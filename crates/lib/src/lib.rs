//! llamagram core library: a Telegram bot that answers questions with a local Ollama model.
//!
//! Updates flow from the Telegram poller through the intake loop to the dispatcher, which
//! answers commands with canned text and forwards everything else to the generation backend.

pub mod bot;
pub mod channels;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod generation;
pub mod init;
pub mod intake;
pub mod llm;
