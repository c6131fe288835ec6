//! Embedding providers behind `docqa_core::traits::Embedder`.
//!
//! - [`HashEmbedder`]: deterministic, model-free (tests/dev)
//! - [`OllamaEmbedder`]: remote embeddings over HTTP
//! - [`LocalEmbedder`]: BGE-M3 in-process via Candle
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` forces the hash embedder regardless of config.

pub mod device;
pub mod hash;
pub mod local;
pub mod ollama;
pub mod pool;
pub mod tokenize;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::{EmbedProviderKind, EmbedSettings};
use docqa_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use local::LocalEmbedder;
pub use ollama::OllamaEmbedder;
pub use pool::masked_mean_l2;

pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn embedder_from_settings(settings: &EmbedSettings) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_forced() {
        info!(dim = settings.dim, "using HashEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbedProviderKind::Hash => Arc::new(HashEmbedder::new(settings.dim)),
        EmbedProviderKind::Ollama => Arc::new(OllamaEmbedder::new(&settings.base_url, &settings.model, settings.dim)?),
        EmbedProviderKind::Local => Arc::new(LocalEmbedder::load_default(settings.model_dir.as_deref())?),
    };
    info!(provider = ?settings.provider, dim = embedder.dim(), "embedder ready");
    Ok(embedder)
}
