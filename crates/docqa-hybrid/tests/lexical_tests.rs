use anyhow::anyhow;
use async_trait::async_trait;
use proptest::prelude::*;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use docqa_core::traits::{FullTextIndex, TextIndexer};
use docqa_core::types::{Chunk, RankedHit};
use docqa_hybrid::lexical::{sanitize_term, search_all, search_one};
use docqa_text::TantivyIndex;

struct FailingIndex {
    calls: AtomicUsize,
}

#[async_trait]
impl FullTextIndex for FailingIndex {
    async fn search(&self, _term: &str, _limit: usize) -> anyhow::Result<Vec<RankedHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("index offline"))
    }
}

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk { id: id.into(), document_id: "report".into(), session_id: "s1".into(), text: text.into() }
}

async fn seeded_index() -> anyhow::Result<TantivyIndex> {
    let index = TantivyIndex::in_memory()?;
    let chunks: Vec<Chunk> = (0..8)
        .map(|i| chunk(&format!("rev{i}"), &format!("quarterly revenue figure number {i} revenue growth")))
        .chain([chunk("ops", "operating costs were flat"), chunk("hr", "headcount grew by twelve people")])
        .collect();
    TextIndexer::index(&index, &chunks).await?;
    Ok(index)
}

#[test]
fn sanitizing_strips_punctuation() {
    assert_eq!(sanitize_term("What was Q2 revenue growth?"), "What was Q2 revenue growth");
    assert_eq!(sanitize_term("  \"cost\" AND (margin) - 2023!  "), "cost AND margin  2023");
    assert_eq!(sanitize_term("?!...;"), "");
}

#[tokio::test]
async fn empty_sanitized_query_yields_no_hits_without_calling_index() {
    let index = FailingIndex { calls: AtomicUsize::new(0) };
    let hits = search_one(&index, "?!*", 5).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_query_is_capped_and_sorted() -> anyhow::Result<()> {
    let index = seeded_index().await?;
    let hits = search_one(&index, "revenue?", 5).await?;
    assert_eq!(hits.len(), 5);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits.iter().all(|h| h.id.starts_with("rev")));
    Ok(())
}

#[tokio::test]
async fn merged_results_are_capped_at_pool() -> anyhow::Result<()> {
    let index = seeded_index().await?;
    let queries = vec!["revenue".to_string(), "quarterly growth".to_string(), "headcount".to_string()];
    let merged = search_all(&index, &queries, 5, 10, Duration::from_secs(5)).await;
    assert_eq!(merged.len(), 10);
    assert!(merged.windows(2).all(|w| w[0].score >= w[1].score));
    Ok(())
}

#[tokio::test]
async fn failing_queries_contribute_nothing() {
    let index = FailingIndex { calls: AtomicUsize::new(0) };
    let queries = vec!["a".to_string(), "b".to_string()];
    let merged = search_all(&index, &queries, 5, 10, Duration::from_secs(5)).await;
    assert!(merged.is_empty());
    assert_eq!(index.calls.load(Ordering::SeqCst), 2);
}

proptest! {
    #[test]
    fn sanitized_terms_hold_only_word_chars_and_whitespace(s in "\\PC{0,64}") {
        let allowed = Regex::new(r"^[\w\s]*$").unwrap();
        let out = sanitize_term(&s);
        prop_assert!(allowed.is_match(&out));
        prop_assert_eq!(out.trim(), out.as_str());
    }

    #[test]
    fn sanitizing_is_idempotent(s in "\\PC{0,64}") {
        let once = sanitize_term(&s);
        prop_assert_eq!(sanitize_term(&once), once);
    }
}
