use docqa_core::traits::{FullTextIndex, TextIndexer};
use docqa_core::types::{Chunk, SourceKind};
use docqa_text::TantivyIndex;
use tempfile::TempDir;

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk { id: id.to_string(), document_id: "q2-report".to_string(), session_id: "s1".to_string(), text: text.to_string() }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk("c1", "Revenue grew 12 percent in Q2 driven by subscription growth and revenue from services."),
        chunk("c2", "Operating expenses were flat quarter over quarter."),
        chunk("c3", "Revenue guidance for the full year was raised."),
        chunk("c4", "The board approved a new share buyback program."),
    ]
}

#[tokio::test]
async fn tantivy_full_flow_on_disk() {
    let tmp = TempDir::new().expect("tmp");
    let index = TantivyIndex::create(&tmp.path().join("tantivy")).expect("index");
    index.index(&corpus()).await.expect("index chunks");
    assert_eq!(index.num_docs(), 4);

    let hits = index.search("revenue growth", 5).await.expect("search");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, "c1", "chunk mentioning revenue twice and growth ranks first");
    assert!(hits.iter().all(|h| h.source == SourceKind::Text));
    for w in hits.windows(2) { assert!(w[0].score >= w[1].score); }

    // reopening sees the committed documents
    let reopened = TantivyIndex::open_or_create(&tmp.path().join("tantivy")).expect("reopen");
    assert_eq!(reopened.num_docs(), 4);
}

#[tokio::test]
async fn search_respects_limit_and_empty_terms() {
    let index = TantivyIndex::in_memory().expect("index");
    index.index(&corpus()).await.expect("index chunks");
    let hits = index.search("revenue", 1).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert!(index.search("", 5).await.expect("empty").is_empty());
    assert!(index.search("   ", 5).await.expect("blank").is_empty());
    assert!(index.search("zeppelin", 5).await.expect("no match").is_empty());
}

#[tokio::test]
async fn operator_words_do_not_fail_the_query() {
    let index = TantivyIndex::in_memory().expect("index");
    index.index(&corpus()).await.expect("index chunks");
    let hits = index.search("NOT revenue AND OR guidance", 5).await.expect("lenient parse");
    assert!(hits.iter().any(|h| h.id == "c3"));
}

#[tokio::test]
async fn reindexing_a_chunk_replaces_it() {
    let index = TantivyIndex::in_memory().expect("index");
    index.index(&corpus()).await.expect("first");
    index.index(&[chunk("c4", "The buyback was cancelled.")]).await.expect("second");
    assert_eq!(index.num_docs(), 4);
    assert!(index.search("program", 5).await.expect("search").is_empty());
}
