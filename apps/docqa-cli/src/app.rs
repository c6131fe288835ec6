use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{expand_path, Settings};
use docqa_core::traits::{ChatModel, Embedder};
use docqa_embed::embedder_from_settings;
use docqa_hybrid::{Collaborators, HybridIndexer, Pipeline, PipelineConfig};
use docqa_llm::OllamaChat;
use docqa_text::TantivyIndex;
use docqa_vector::LanceChunkTable;

/// `RUST_LOG` wins; otherwise `-v` flags pick the level. Logs go to stderr.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The on-disk indexes plus the embedder that fills and queries them.
pub struct Backends {
    pub text: Arc<TantivyIndex>,
    pub table: Arc<LanceChunkTable>,
    pub embedder: Arc<dyn Embedder>,
}

impl Backends {
    pub async fn open(settings: &Settings) -> Result<Self> {
        let embedder = embedder_from_settings(&settings.embed)?;
        let tantivy_dir = expand_path(&settings.data.tantivy_index_dir);
        let lance_dir = expand_path(&settings.data.lancedb_dir);
        let text = Arc::new(TantivyIndex::open_or_create(&tantivy_dir)?);
        let table = Arc::new(LanceChunkTable::open(&lance_dir, &settings.data.table_name, embedder.dim()).await?);
        info!(tantivy = %tantivy_dir.display(), lancedb = %lance_dir.display(), docs = text.num_docs(), "indexes opened");
        Ok(Self { text, table, embedder })
    }

    pub fn indexer(&self) -> HybridIndexer {
        HybridIndexer::new(self.text.clone(), self.table.clone(), self.embedder.clone())
    }

    pub fn collaborators(&self, chat: Arc<dyn ChatModel>) -> Collaborators {
        Collaborators {
            chat,
            embedder: self.embedder.clone(),
            text_index: self.text.clone(),
            vector_index: self.table.clone(),
            chunks: self.table.clone(),
        }
    }
}

/// Open the indexes and connect the Ollama chat model.
pub async fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    let backends = Backends::open(settings).await?;
    let chat = Arc::new(OllamaChat::new(&settings.llm)?);
    info!(chat_model = %settings.llm.chat_model, "pipeline ready");
    Ok(Pipeline::new(backends.collaborators(chat), PipelineConfig::from(&settings.pipeline)))
}
