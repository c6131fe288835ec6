//! Domain types shared by the retrieval backends and the answering pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type SessionId = String;
pub type Meta = HashMap<String, String>;

/// A span of an ingested document's text; the unit of retrieval and citation.
///
/// - `id`: globally unique, stable chunk identifier
/// - `document_id`: owning document (file stem or external id)
/// - `session_id`: corpus/conversation scope the chunk belongs to
/// - `text`: the chunk body
///
/// Chunks are written once during ingestion and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: String,
    pub session_id: SessionId,
    pub text: String,
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// One full-text hit. `score` is the index's native relevance, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// One nearest-neighbour match from the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: ChunkId,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Meta>,
}

/// The ordered matches returned for a single vector query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorQueryResult {
    pub matches: Vec<VectorMatch>,
}

/// A chunk id with its accumulated fusion score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    pub id: ChunkId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self { Self::new(Role::System, content) }
    pub fn user(content: impl Into<String>) -> Self { Self::new(Role::User, content) }
    pub fn assistant(content: impl Into<String>) -> Self { Self::new(Role::Assistant, content) }
}

/// A single question against one session's corpus, as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub session_id: SessionId,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl AskRequest {
    pub fn new(session_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { session_id: session_id.into(), messages }
    }

    /// Content of the most recent non-blank user message.
    pub fn latest_user_query(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .find(|c| !c.is_empty())
    }
}

/// Events pushed to the caller while a request is processed.
///
/// Serializes to the wire shapes `{"message": ..}`, `{"queries": [..]}`,
/// `{"chunk": ..}` and `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineEvent {
    Progress { message: String },
    Queries { queries: Vec<String> },
    Content { chunk: String },
    Error { error: String },
}

impl PipelineEvent {
    pub fn progress(message: impl Into<String>) -> Self { Self::Progress { message: message.into() } }
    pub fn content(chunk: impl Into<String>) -> Self { Self::Content { chunk: chunk.into() } }
    pub fn error(error: impl Into<String>) -> Self { Self::Error { error: error.into() } }

    pub fn is_error(&self) -> bool { matches!(self, Self::Error { .. }) }
}
