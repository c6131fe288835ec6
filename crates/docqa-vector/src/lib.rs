//! docqa-vector
//!
//! LanceDB table holding chunk text next to its embedding. The same table
//! serves as the session-filtered vector index and as the chunk store used to
//! resolve fused ids back to text.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

use anyhow::Result;
use lancedb::{Connection, Table};
use std::path::Path;

pub struct LanceChunkTable {
    pub(crate) db: Connection,
    pub(crate) table_name: String,
    pub(crate) dim: usize,
}

impl LanceChunkTable {
    pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let db = table::open_db(db_path.to_string_lossy().as_ref()).await?;
        Ok(Self { db, table_name: table_name.to_string(), dim })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub(crate) async fn table(&self) -> Result<Option<Table>> {
        table::open_table_if_exists(&self.db, &self.table_name).await
    }

    pub async fn count_rows(&self) -> Result<usize> {
        match self.table().await? {
            Some(t) => Ok(t.count_rows(None).await?),
            None => Ok(0),
        }
    }
}
