//! Semantic search: embed each expanded query and look up its nearest chunks
//! within the session.

use anyhow::anyhow;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, warn};

use docqa_core::traits::{Embedder, VectorIndex};
use docqa_core::types::VectorQueryResult;

pub async fn search_one(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    query: &str,
    top_k: usize,
    session_id: &str,
) -> anyhow::Result<VectorQueryResult> {
    let vector = embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("embedder returned no vector"))?;
    let matches = index.query(&vector, top_k, session_id).await?;
    Ok(VectorQueryResult { matches })
}

/// One result per query, in query order. A failed or timed-out query yields an
/// empty result.
pub async fn search_all(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    queries: &[String],
    top_k: usize,
    session_id: &str,
    timeout: Duration,
) -> Vec<VectorQueryResult> {
    let calls = queries.iter().map(|q| async move {
        match tokio::time::timeout(timeout, search_one(embedder, index, q, top_k, session_id)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(query = %q, error = %e, "vector search failed");
                VectorQueryResult::default()
            }
            Err(_) => {
                warn!(query = %q, timeout_secs = timeout.as_secs(), "vector search timed out");
                VectorQueryResult::default()
            }
        }
    });
    let results = join_all(calls).await;
    debug!(matches = results.iter().map(|r| r.matches.len()).sum::<usize>(), "vector results collected");
    results
}
