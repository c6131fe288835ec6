//! LanceDB connection and housekeeping helpers.
//!
//! Provides database open functions, an ensure-table helper, SQL literal
//! quoting for filters, and typed column access on result batches.

use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<Table> {
    if let Some(table) = open_table_if_exists(conn, name).await? {
        return Ok(table);
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    Ok(conn.create_table(name, Box::new(iter)).execute().await?)
}

pub async fn open_table_if_exists(conn: &Connection, name: &str) -> Result<Option<Table>> {
    let names = conn.table_names().execute().await?;
    if !names.iter().any(|n| n == name) { return Ok(None); }
    Ok(Some(conn.open_table(name).execute().await?))
}

/// Quote a string as a SQL literal for LanceDB filter expressions.
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `column IN ('a', 'b', ...)`
pub fn in_list(column: &str, values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| sql_quote(v)).collect();
    format!("{} IN ({})", column, quoted.join(", "))
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing or not utf8"))
}

pub fn f32_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Float32Array> {
    batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Float32Array>())
}

/// Value at `row`, treating nulls as empty.
pub fn str_at(col: &StringArray, row: usize) -> &str {
    if col.is_null(row) { "" } else { col.value(row) }
}
