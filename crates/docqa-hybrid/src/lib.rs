//! Hybrid retrieval and streamed answering.
//!
//! A request flows expander → lexical + vector search → RRF fusion →
//! context assembly → streamed generation, with progress reported through
//! a bounded event channel.

pub mod context;
pub mod expander;
pub mod fusion;
pub mod ingest;
pub mod lexical;
pub mod pipeline;
pub mod stream;
pub mod vector;

pub use fusion::RrfFusion;
pub use ingest::HybridIndexer;
pub use pipeline::{Collaborators, Pipeline, PipelineConfig, Stage};
