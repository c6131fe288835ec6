//! Collaborator seams. The pipeline receives these as `Arc<dyn Trait>` handles.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::types::{ChatMessage, Chunk, RankedHit, VectorMatch};

/// Stream of decoded answer fragments from a generative model.
pub type TokenStream = BoxStream<'static, anyhow::Result<String>>;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Single non-streamed completion of `prompt`.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
    /// Submit a conversation and stream the reply as it is produced.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> anyhow::Result<TokenStream>;
}

/// Read side of the full-text index. `term` is already sanitized.
#[async_trait]
pub trait FullTextIndex: Send + Sync {
    async fn search(&self, term: &str, limit: usize) -> anyhow::Result<Vec<RankedHit>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize, session_id: &str) -> anyhow::Result<Vec<VectorMatch>>;
}

/// Batch chunk lookup. Unknown ids are absent from the result; order is unspecified.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn get_chunks_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Chunk>>;
}

#[async_trait]
pub trait TextIndexer: Send + Sync {
    async fn index(&self, chunks: &[Chunk]) -> anyhow::Result<()>;
}

#[async_trait]
pub trait VectorIndexer: Send + Sync {
    async fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
}
