//! Reciprocal Rank Fusion: score = Σ 1/(k + rank + 1), rank zero-based.
//!
//! Merges the lexical list and every vector result list into one ranking
//! without normalizing the engines' native scores.

use std::cmp::Ordering;
use std::collections::HashMap;

use docqa_core::types::{FusedHit, RankedHit, VectorQueryResult};

pub const DEFAULT_RRF_K: f64 = 60.0;

/// Accumulates RRF scores over any number of ranked id lists.
#[derive(Debug, Clone)]
pub struct RrfFusion {
    k: f64,
    scores: HashMap<String, f64>,
}

impl Default for RrfFusion {
    fn default() -> Self { Self::new(DEFAULT_RRF_K) }
}

impl RrfFusion {
    pub fn new(k: f64) -> Self { Self { k, scores: HashMap::new() } }

    /// Add one list, best first. Empty ids are skipped but still occupy their rank.
    pub fn add_list<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (rank, id) in ids.into_iter().enumerate() {
            let id = id.as_ref();
            if id.is_empty() { continue; }
            #[allow(clippy::cast_precision_loss)]
            let rrf = 1.0 / (self.k + rank as f64 + 1.0);
            *self.scores.entry(id.to_string()).or_default() += rrf;
        }
        self
    }

    pub fn add_hits(&mut self, hits: &[RankedHit]) -> &mut Self {
        self.add_list(hits.iter().map(|h| h.id.as_str()))
    }

    /// Each vector result is fused as its own list.
    pub fn add_vector_results(&mut self, results: &[VectorQueryResult]) -> &mut Self {
        for result in results {
            self.add_list(result.matches.iter().map(|m| m.id.as_str()));
        }
        self
    }

    pub fn len(&self) -> usize { self.scores.len() }
    pub fn is_empty(&self) -> bool { self.scores.is_empty() }

    /// All fused ids, highest score first. Ties come out in no particular order.
    pub fn into_ranked(self) -> Vec<FusedHit> {
        let mut fused: Vec<FusedHit> = self.scores.into_iter().map(|(id, score)| FusedHit { id, score }).collect();
        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        fused
    }
}

/// Fuse one lexical list with the per-query vector lists.
pub fn fuse(lexical: &[RankedHit], vector: &[VectorQueryResult], k: f64) -> Vec<FusedHit> {
    let mut rrf = RrfFusion::new(k);
    rrf.add_hits(lexical).add_vector_results(vector);
    rrf.into_ranked()
}
