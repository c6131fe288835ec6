use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use docqa_core::traits::{FullTextIndex, TextIndexer};
use docqa_core::types::{Chunk, RankedHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

#[derive(Clone, Copy)]
struct Fields {
	id: Field,
	document_id: Field,
	session_id: Field,
	text: Field,
}

/// Full-text index of chunk bodies. Cheap to clone; clones share the index.
#[derive(Clone)]
pub struct TantivyIndex {
	index: Index,
	reader: IndexReader,
	fields: Fields,
}

impl TantivyIndex {
	/// Create a fresh index in `index_dir`, wiping anything already there.
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema())
			.with_context(|| format!("creating tantivy index in {}", index_dir.display()))?;
		Self::from_index(index)
	}

	/// Open an existing index, or create one if `index_dir` holds none.
	pub fn open_or_create(index_dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(index_dir)?;
		let dir = tantivy::directory::MmapDirectory::open(index_dir)?;
		let index = Index::open_or_create(dir, build_schema())
			.with_context(|| format!("opening tantivy index in {}", index_dir.display()))?;
		Self::from_index(index)
	}

	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let fields = Fields {
			id: schema.get_field("id")?,
			document_id: schema.get_field("document_id")?,
			session_id: schema.get_field("session_id")?,
			text: schema.get_field("text")?,
		};
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, fields })
	}

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	fn index_blocking(&self, chunks: &[Chunk]) -> Result<()> {
		let mut writer: IndexWriter = self.index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
		let f = self.fields;
		for c in chunks {
			// re-ingesting a chunk replaces it
			writer.delete_term(Term::from_field_text(f.id, &c.id));
			writer.add_document(doc!(
				f.id => c.id.clone(),
				f.document_id => c.document_id.clone(),
				f.session_id => c.session_id.clone(),
				f.text => c.text.clone(),
			))?;
		}
		writer.commit()?;
		self.reader.reload()?;
		info!(chunks = chunks.len(), "tantivy commit");
		Ok(())
	}

	fn search_blocking(&self, term: &str, limit: usize) -> Result<Vec<RankedHit>> {
		if term.trim().is_empty() || limit == 0 { return Ok(vec![]); }
		let qp = QueryParser::for_index(&self.index, vec![self.fields.text]);
		// lowercase so AND/OR/NOT are matched as words rather than operators
		let (query, errors) = qp.parse_query_lenient(&term.to_lowercase());
		if !errors.is_empty() { debug!(term, ?errors, "lenient query parse dropped clauses"); }
		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let id = doc.get_first(self.fields.id).and_then(|v| v.as_str()).unwrap_or("").to_string();
			hits.push(RankedHit { id, score, source: SourceKind::Text });
		}
		Ok(hits)
	}
}

#[async_trait]
impl FullTextIndex for TantivyIndex {
	async fn search(&self, term: &str, limit: usize) -> Result<Vec<RankedHit>> {
		let this = self.clone();
		let term = term.to_string();
		tokio::task::spawn_blocking(move || this.search_blocking(&term, limit)).await?
	}
}

#[async_trait]
impl TextIndexer for TantivyIndex {
	async fn index(&self, chunks: &[Chunk]) -> Result<()> {
		if chunks.is_empty() { return Ok(()); }
		let this = self.clone();
		let chunks = chunks.to_vec();
		tokio::task::spawn_blocking(move || this.index_blocking(&chunks)).await?
	}
}
