//! Keyword search over the full-text index, one call per expanded query.

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, warn};

use docqa_core::traits::FullTextIndex;
use docqa_core::types::RankedHit;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid word pattern"));

/// Remove every character that is neither a word character nor whitespace.
pub fn sanitize_term(query: &str) -> String {
    NON_WORD.replace_all(query, "").trim().to_string()
}

fn by_score_desc(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

/// Up to `limit` hits for one query, best first. A query that sanitizes to
/// nothing returns no hits.
pub async fn search_one(index: &dyn FullTextIndex, query: &str, limit: usize) -> anyhow::Result<Vec<RankedHit>> {
    let term = sanitize_term(query);
    if term.is_empty() {
        debug!(query, "query empty after sanitizing, skipping lexical search");
        return Ok(vec![]);
    }
    let mut hits = index.search(&term, limit).await?;
    hits.sort_by(by_score_desc);
    hits.truncate(limit);
    Ok(hits)
}

/// Run every query concurrently and merge the results into one list capped
/// at `pool`. A failed or timed-out query contributes nothing.
pub async fn search_all(
    index: &dyn FullTextIndex,
    queries: &[String],
    limit: usize,
    pool: usize,
    timeout: Duration,
) -> Vec<RankedHit> {
    let calls = queries.iter().map(|q| async move {
        match tokio::time::timeout(timeout, search_one(index, q, limit)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(query = %q, error = %e, "lexical search failed");
                vec![]
            }
            Err(_) => {
                warn!(query = %q, timeout_secs = timeout.as_secs(), "lexical search timed out");
                vec![]
            }
        }
    });
    let mut merged: Vec<RankedHit> = join_all(calls).await.into_iter().flatten().collect();
    merged.sort_by(by_score_desc);
    merged.truncate(pool);
    debug!(hits = merged.len(), "lexical results merged");
    merged
}
