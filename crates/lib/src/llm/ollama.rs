//! Ollama API client (http://localhost:11434 by default).
//! Streams `/api/generate` (NDJSON) and lists local models.

use crate::llm::{GenerationBackend, LlmError};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /api/tags: list available models.
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: TagsResponse = res.json().await?;
        Ok(data.models.unwrap_or_default())
    }

    /// POST /api/generate with stream: true. Parses NDJSON and calls `on_fragment` for each
    /// non-empty `response` delta in arrival order. Returns once the backend reports `done`.
    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) -> Result<(), LlmError> + Send),
    ) -> Result<(), LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: true,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let mut stream = res.bytes_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);
            while let Some(i) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=i).collect();
                if handle_line(&line, on_fragment)? {
                    return Ok(());
                }
            }
        }
        // Final line may arrive without a trailing newline.
        if handle_line(&buffer, on_fragment)? {
            return Ok(());
        }
        Err(LlmError::Interrupted)
    }
}

/// Process one NDJSON line. Returns true when the backend signalled completion.
fn handle_line(
    line: &[u8],
    on_fragment: &mut (dyn for<'a> FnMut(&'a str) -> Result<(), LlmError> + Send),
) -> Result<bool, LlmError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }
    let event: GenerateStreamEvent = match serde_json::from_str(line) {
        Ok(e) => e,
        Err(e) => {
            log::debug!("ollama: skipping unparseable stream line: {}", e);
            return Ok(false);
        }
    };
    if let Some(err) = event.error {
        return Err(LlmError::Api(err));
    }
    if !event.response.is_empty() {
        on_fragment(&event.response)?;
    }
    Ok(event.done)
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) -> Result<(), LlmError> + Send),
    ) -> Result<(), LlmError> {
        self.generate_stream(model, prompt, on_fragment).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateStreamEvent {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<OllamaModel>>,
}
