use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID: &str = "id";
pub const DOCUMENT_ID: &str = "document_id";
pub const SESSION_ID: &str = "session_id";
pub const TEXT: &str = "text";
pub const VECTOR: &str = "vector";
pub const DISTANCE: &str = "_distance";

/// Chunk table layout: one row per chunk, embedding in a fixed-size list of `dim` floats.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID, DataType::Utf8, false),
		Field::new(DOCUMENT_ID, DataType::Utf8, false),
		Field::new(SESSION_ID, DataType::Utf8, false),
		Field::new(TEXT, DataType::Utf8, false),
		Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
