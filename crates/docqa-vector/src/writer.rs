use anyhow::{bail, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::info;

use docqa_core::traits::VectorIndexer;
use docqa_core::types::Chunk;

use crate::schema::build_arrow_schema;
use crate::table::ensure_table;
use crate::LanceChunkTable;

const BATCH_SIZE: usize = 1000;

impl LanceChunkTable {
	fn to_record_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.dim)?;
		let vectors = embeddings.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(build_arrow_schema(dim), vec![
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.document_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.session_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()))),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
		])?;
		Ok(record_batch)
	}

	/// Upsert one batch keyed on chunk id.
	async fn upsert_batch(&self, table: &lancedb::Table, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
		let record_batch = self.to_record_batch(chunks, embeddings)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		let mut mi = table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		mi.execute(reader).await?;
		Ok(())
	}
}

#[async_trait]
impl VectorIndexer for LanceChunkTable {
	async fn index(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		if chunks.len() != embeddings.len() {
			bail!("chunks and embeddings length must match ({} vs {})", chunks.len(), embeddings.len());
		}
		if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
			bail!("embedding has dim {}, table expects {}", bad.len(), self.dim);
		}
		let table = ensure_table(&self.db, &self.table_name, build_arrow_schema(i32::try_from(self.dim)?)).await?;
		info!(chunks = chunks.len(), table = %self.table_name, "indexing into LanceDB");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?.progress_chars("#>-"));
		for (chunk_batch, emb_batch) in chunks.chunks(BATCH_SIZE).zip(embeddings.chunks(BATCH_SIZE)) {
			self.upsert_batch(&table, chunk_batch, emb_batch).await?;
			pb.inc(chunk_batch.len() as u64);
		}
		pb.finish_and_clear();
		info!(chunks = chunks.len(), "LanceDB indexing completed");
		Ok(())
	}
}
