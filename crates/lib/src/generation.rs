//! Generation client: one prompt in, one full reply out.
//!
//! Wraps a streaming [`GenerationBackend`] and concatenates every fragment, in delivery order,
//! into a single string. A failed stream yields an error and no partial text. Never retried.

use crate::llm::{GenerationBackend, LlmError};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    Backend(#[from] LlmError),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Issues generation requests for a fixed model.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
    model: String,
    timeout: Option<Duration>,
}

impl Generator {
    pub fn new(backend: Arc<dyn GenerationBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout: None,
        }
    }

    /// Bound each request by `timeout`. `None` waits for the backend indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one generation request and return the concatenated reply (possibly empty).
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut reply = String::new();
        {
            let mut on_fragment = |fragment: &str| -> Result<(), LlmError> {
                reply.push_str(fragment);
                Ok(())
            };
            let call = self.backend.generate(&self.model, prompt, &mut on_fragment);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| GenerationError::Timeout(limit))??,
                None => call.await?,
            }
        }
        Ok(reply)
    }
}
