use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use tracing::debug;

use docqa_core::traits::{ChunkStore, VectorIndex};
use docqa_core::types::{Chunk, Meta, VectorMatch};

use crate::schema::{DISTANCE, DOCUMENT_ID, ID, SESSION_ID, TEXT};
use crate::table::{f32_column, in_list, sql_quote, str_at, string_column};
use crate::LanceChunkTable;

#[async_trait]
impl VectorIndex for LanceChunkTable {
	/// Nearest chunks within `session_id`, best first. Score is `1 - cosine distance`.
	async fn query(&self, vector: &[f32], top_k: usize, session_id: &str) -> Result<Vec<VectorMatch>> {
		if vector.len() != self.dim { bail!("query vector has dim {}, table expects {}", vector.len(), self.dim); }
		let Some(table) = self.table().await? else { return Ok(vec![]); };
		let filter = format!("{} = {}", SESSION_ID, sql_quote(session_id));
		let mut stream = table
			.vector_search(vector.to_vec())?
			.distance_type(DistanceType::Cosine)
			.only_if(filter)
			.limit(top_k)
			.execute()
			.await?;
		let mut matches = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = string_column(&batch, ID)?;
			let doc_ids = string_column(&batch, DOCUMENT_ID)?;
			let sessions = string_column(&batch, SESSION_ID)?;
			let distances = f32_column(&batch, DISTANCE);
			for i in 0..batch.num_rows() {
				let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
				let mut metadata = Meta::new();
				metadata.insert(DOCUMENT_ID.to_string(), str_at(doc_ids, i).to_string());
				metadata.insert(SESSION_ID.to_string(), str_at(sessions, i).to_string());
				matches.push(VectorMatch { id: str_at(ids, i).to_string(), score, metadata: Some(metadata) });
			}
		}
		// the index returns best-first already; keep that order across batches
		matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		matches.truncate(top_k);
		debug!(session_id, hits = matches.len(), "vector query");
		Ok(matches)
	}
}

#[async_trait]
impl ChunkStore for LanceChunkTable {
	async fn get_chunks_by_ids(&self, ids: &[String]) -> Result<Vec<Chunk>> {
		let mut unique: Vec<String> = ids.iter().filter(|id| !id.is_empty()).cloned().collect();
		unique.sort();
		unique.dedup();
		if unique.is_empty() { return Ok(vec![]); }
		let Some(table) = self.table().await? else { return Ok(vec![]); };
		let mut stream = table
			.query()
			.only_if(in_list(ID, &unique))
			.limit(unique.len())
			.execute()
			.await?;
		let mut chunks = Vec::with_capacity(unique.len());
		while let Some(batch) = stream.try_next().await? {
			let id_col = string_column(&batch, ID)?;
			let doc_col = string_column(&batch, DOCUMENT_ID)?;
			let session_col = string_column(&batch, SESSION_ID)?;
			let text_col = string_column(&batch, TEXT)?;
			for i in 0..batch.num_rows() {
				chunks.push(Chunk {
					id: str_at(id_col, i).to_string(),
					document_id: str_at(doc_col, i).to_string(),
					session_id: str_at(session_col, i).to_string(),
					text: str_at(text_col, i).to_string(),
				});
			}
		}
		Ok(chunks)
	}
}
