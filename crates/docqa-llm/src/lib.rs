//! docqa-llm
//!
//! Generative model client for an Ollama server: one-shot completions for
//! query rewriting and NDJSON-streamed chat for answers.

pub mod ndjson;
pub mod ollama;

pub use ndjson::{decode_chat_stream, NdjsonDecoder};
pub use ollama::OllamaChat;
