//! LLM backend abstraction and Ollama client.
//!
//! A backend streams generated text for one prompt; callers receive fragments through a callback.

mod ollama;

use async_trait::async_trait;

pub use ollama::{OllamaClient, OllamaModel};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm stream ended before completion")]
    Interrupted,
    #[error("llm stream aborted: {0}")]
    Aborted(String),
}

/// Streaming text generation. `on_fragment` is called once per response fragment, in order,
/// until the stream completes; an `Err` from the callback aborts the stream and is returned.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) -> Result<(), LlmError> + Send),
    ) -> Result<(), LlmError>;
}
