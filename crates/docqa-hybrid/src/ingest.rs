//! Write side: embeds chunks and feeds both indexes.

use anyhow::{ensure, Result};
use std::sync::Arc;
use tracing::{debug, info};

use docqa_core::traits::{Embedder, TextIndexer, VectorIndexer};
use docqa_core::types::Chunk;

pub const DEFAULT_EMBED_BATCH: usize = 32;

pub struct HybridIndexer {
    text: Arc<dyn TextIndexer>,
    vector: Arc<dyn VectorIndexer>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl HybridIndexer {
    pub fn new(text: Arc<dyn TextIndexer>, vector: Arc<dyn VectorIndexer>, embedder: Arc<dyn Embedder>) -> Self {
        Self { text, vector, embedder, batch_size: DEFAULT_EMBED_BATCH }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed in batches, write the vector table, then the full-text index.
    /// Returns the number of chunks indexed.
    pub async fn index(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() { return Ok(0); }
        let dim = self.embedder.dim();
        let mut embeddings = Vec::with_capacity(chunks.len());
        for (n, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_embeddings = self.embedder.embed(&texts).await?;
            ensure!(
                batch_embeddings.len() == batch.len(),
                "embedder returned {} vectors for {} chunks",
                batch_embeddings.len(),
                batch.len()
            );
            for e in &batch_embeddings {
                ensure!(e.len() == dim, "embedding has dim {}, expected {}", e.len(), dim);
            }
            embeddings.extend(batch_embeddings);
            debug!(batch = n + 1, size = batch.len(), "embedded batch");
        }
        self.vector.index(chunks, &embeddings).await?;
        self.text.index(chunks).await?;
        info!(chunks = chunks.len(), "hybrid ingest complete");
        Ok(chunks.len())
    }
}
