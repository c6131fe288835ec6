use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use docqa_core::config::LlmSettings;
use docqa_core::traits::{ChatModel, TokenStream};
use docqa_core::types::ChatMessage;

use crate::ndjson::decode_chat_stream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat model served by Ollama (`/api/generate` and `/api/chat`).
pub struct OllamaChat {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    completion_model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: Options,
}

impl OllamaChat {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            chat_model: settings.chat_model.clone(),
            completion_model: settings.expansion_model.clone(),
            temperature: settings.temperature,
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T, timeout: Option<Duration>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(t) = timeout { request = request.timeout(t); }
        let response = request.send().await.with_context(|| format!("Ollama HTTP error calling {url}"))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama returned {status}: {body}");
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
            options: Options { temperature: self.temperature },
        };
        let response = self.post("/api/generate", &body, Some(COMPLETION_TIMEOUT)).await?;
        let parsed: GenerateResponse = response.json().await.context("Ollama JSON parse error")?;
        debug!(model = %self.completion_model, chars = parsed.response.len(), "completion");
        Ok(parsed.response)
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: true,
            options: Options { temperature: self.temperature },
        };
        let response = self.post("/api/chat", &body, None).await?;
        debug!(model = %self.chat_model, messages = messages.len(), "chat stream opened");
        Ok(decode_chat_stream(response.bytes_stream()))
    }
}
