use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use docqa_core::traits::Embedder;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Embeddings from an Ollama server's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dim: usize) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), model: model.into(), dim })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let url = format!("{}/api/embed", self.base_url);
        let response = self.client
            .post(&url)
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .await
            .with_context(|| format!("Ollama HTTP error calling {url}"))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama returned {status}: {body}");
        }
        let parsed: EmbedResponse = response.json().await.context("Ollama JSON parse error")?;
        if parsed.embeddings.len() != texts.len() {
            bail!("Ollama returned {} embeddings for {} inputs", parsed.embeddings.len(), texts.len());
        }
        if let Some(v) = parsed.embeddings.iter().find(|v| v.len() != self.dim) {
            bail!("Ollama model {} returned dim {}, expected {}", self.model, v.len(), self.dim);
        }
        debug!(count = texts.len(), model = %self.model, "embedded via ollama");
        Ok(parsed.embeddings)
    }
}
