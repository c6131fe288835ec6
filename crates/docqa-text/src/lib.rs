//! docqa-text
//!
//! Tantivy-backed full-text index over chunks. Serves the lexical side of
//! hybrid retrieval (`FullTextIndex`) and accepts chunks at ingest time
//! (`TextIndexer`).

pub mod index;
pub mod tantivy_utils;

pub use index::TantivyIndex;
