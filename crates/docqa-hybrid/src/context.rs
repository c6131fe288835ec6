//! Resolves fused chunk ids to text and formats numbered citations.

use std::collections::HashMap;
use tracing::debug;

use docqa_core::traits::ChunkStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// 1-based citation number.
    pub citation: usize,
    pub chunk_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub passages: Vec<Passage>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool { self.passages.is_empty() }

    /// `[n]: text` per passage, separated by blank lines.
    pub fn render(&self) -> String {
        self.passages
            .iter()
            .map(|p| format!("[{}]: {}", p.citation, p.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Fetch `ids` in one batch and keep them in the given rank order. Ids the
/// store does not know are dropped and the remaining passages are numbered
/// consecutively.
pub async fn assemble(store: &dyn ChunkStore, ids: &[String]) -> anyhow::Result<AssembledContext> {
    if ids.is_empty() { return Ok(AssembledContext::default()); }
    let fetched = store.get_chunks_by_ids(ids).await?;
    let mut by_id: HashMap<String, String> = fetched.into_iter().map(|c| (c.id, c.text)).collect();
    let passages: Vec<Passage> = ids
        .iter()
        .filter_map(|id| by_id.remove(id).map(|text| (id, text)))
        .enumerate()
        .map(|(i, (id, text))| Passage { citation: i + 1, chunk_id: id.clone(), text })
        .collect();
    if passages.len() < ids.len() {
        debug!(requested = ids.len(), resolved = passages.len(), "some chunk ids did not resolve");
    }
    Ok(AssembledContext { passages })
}
