//! Per-request coordinator.
//!
//! `Received → Expanding → Searching → Fusing → AssemblingContext →
//! Generating → Done`, with `Failed` reachable from every non-terminal stage.
//! Search failures are downgraded to empty contributions; failures of the
//! required stages end the request with exactly one error event. The event
//! sender is owned by the run and dropped on every exit path, which is how
//! the caller observes completion.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, Instrument};

use docqa_core::config::PipelineSettings;
use docqa_core::traits::{ChatModel, ChunkStore, Embedder, FullTextIndex, VectorIndex};
use docqa_core::types::{AskRequest, ChatMessage, PipelineEvent};
use docqa_core::Error;

use crate::context::{self, AssembledContext};
use crate::expander;
use crate::fusion::RrfFusion;
use crate::lexical;
use crate::stream::{self, RelayOutcome};
use crate::vector;

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatModel>,
    pub embedder: Arc<dyn Embedder>,
    pub text_index: Arc<dyn FullTextIndex>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub chunks: Arc<dyn ChunkStore>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub rrf_k: f64,
    pub max_queries: usize,
    pub lexical_limit: usize,
    pub lexical_pool: usize,
    pub vector_top_k: usize,
    pub context_top_k: usize,
    pub stage_timeout: Duration,
    pub event_buffer: usize,
    pub system_prompt: String,
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(s: &PipelineSettings) -> Self {
        Self {
            rrf_k: s.rrf_k,
            max_queries: s.max_queries,
            lexical_limit: s.lexical_limit,
            lexical_pool: s.lexical_pool,
            vector_top_k: s.vector_top_k,
            context_top_k: s.context_top_k,
            stage_timeout: s.stage_timeout(),
            event_buffer: s.event_buffer,
            system_prompt: s.system_prompt.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self { Self::from(&PipelineSettings::default()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Expanding,
    Searching,
    Fusing,
    AssemblingContext,
    Generating,
    Done,
    Failed,
}

impl Stage {
    /// Progress text announced when the stage is entered, if any.
    pub fn progress_message(self) -> Option<&'static str> {
        match self {
            Stage::Expanding => Some("Rewriting queries"),
            Stage::Searching => Some("Searching"),
            Stage::AssemblingContext => Some("Compiling context"),
            Stage::Generating => Some("Generating answer"),
            Stage::Received | Stage::Fusing | Stage::Done | Stage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool { matches!(self, Stage::Done | Stage::Failed) }
}

enum Halt {
    Failed(Error),
    SinkClosed,
}

impl From<Error> for Halt {
    fn from(e: Error) -> Self { Halt::Failed(e) }
}

/// Validated view of an incoming request.
struct Question<'a> {
    session_id: &'a str,
    query: &'a str,
}

fn validate(request: &AskRequest) -> Result<Question<'_>, Error> {
    let session_id = request.session_id.trim();
    if session_id.is_empty() {
        return Err(Error::Validation("a session id is required".to_string()));
    }
    if request.messages.is_empty() {
        return Err(Error::Validation("the message history is empty".to_string()));
    }
    let query = request
        .latest_user_query()
        .ok_or_else(|| Error::Validation("there is no user message to answer".to_string()))?;
    Ok(Question { session_id, query })
}

/// System prompt, then the caller's history, then the numbered context as a
/// trailing assistant message when any passage resolved.
pub fn build_conversation(system_prompt: &str, history: &[ChatMessage], context: &AssembledContext) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    if !context.is_empty() {
        messages.push(ChatMessage::assistant(context.render()));
    }
    messages
}

#[derive(Clone)]
pub struct Pipeline {
    collaborators: Collaborators,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        Self { collaborators, config }
    }

    pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Run `request` on a background task and hand back the event receiver.
    pub fn spawn(&self, request: AskRequest) -> mpsc::Receiver<PipelineEvent> {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let this = self.clone();
        tokio::spawn(async move {
            this.run(request, tx).await;
        });
        rx
    }

    /// Process one request, pushing events into `sink`. Returns the terminal stage.
    pub async fn run(&self, request: AskRequest, sink: mpsc::Sender<PipelineEvent>) -> Stage {
        let span = info_span!("ask", session_id = %request.session_id);
        async move {
            let mut run = Run { pipeline: self, sink: &sink, stage: Stage::Received };
            match run.execute(&request).await {
                Ok(()) => {
                    run.stage = Stage::Done;
                    info!("request complete");
                }
                Err(Halt::SinkClosed) => {
                    info!(stage = ?run.stage, "caller closed the stream, abandoning request");
                    run.stage = Stage::Failed;
                }
                Err(Halt::Failed(err)) => {
                    error!(stage = ?run.stage, error = %err, "request failed");
                    run.stage = Stage::Failed;
                    let _ = sink.send(PipelineEvent::error(err.user_message())).await;
                }
            }
            run.stage
        }
        .instrument(span)
        .await
    }
}

struct Run<'a> {
    pipeline: &'a Pipeline,
    sink: &'a mpsc::Sender<PipelineEvent>,
    stage: Stage,
}

impl Run<'_> {
    async fn emit(&self, event: PipelineEvent) -> Result<(), Halt> {
        self.sink.send(event).await.map_err(|_| Halt::SinkClosed)
    }

    async fn enter(&mut self, stage: Stage) -> Result<(), Halt> {
        debug!(from = ?self.stage, to = ?stage, "stage transition");
        self.stage = stage;
        if let Some(message) = stage.progress_message() {
            info!(message, "progress");
            self.emit(PipelineEvent::progress(message)).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, request: &AskRequest) -> Result<(), Halt> {
        let question = validate(request)?;
        let pipeline = self.pipeline;
        let c = &pipeline.collaborators;
        let cfg = &pipeline.config;
        let timeout = cfg.stage_timeout;

        self.enter(Stage::Expanding).await?;
        let queries = expander::expand(c.chat.as_ref(), question.query, cfg.max_queries, timeout).await;
        self.emit(PipelineEvent::Queries { queries: queries.clone() }).await?;

        self.enter(Stage::Searching).await?;
        let (lexical_hits, vector_results) = tokio::join!(
            lexical::search_all(c.text_index.as_ref(), &queries, cfg.lexical_limit, cfg.lexical_pool, timeout),
            vector::search_all(
                c.embedder.as_ref(),
                c.vector_index.as_ref(),
                &queries,
                cfg.vector_top_k,
                question.session_id,
                timeout,
            ),
        );

        self.enter(Stage::Fusing).await?;
        let mut rrf = RrfFusion::new(cfg.rrf_k);
        rrf.add_hits(&lexical_hits).add_vector_results(&vector_results);
        let candidates = rrf.len();
        let top_ids: Vec<String> = rrf.into_ranked().into_iter().take(cfg.context_top_k).map(|h| h.id).collect();
        info!(candidates, selected = top_ids.len(), "fused search results");

        self.enter(Stage::AssemblingContext).await?;
        let context = tokio::time::timeout(timeout, context::assemble(c.chunks.as_ref(), &top_ids))
            .await
            .map_err(|_| Error::Timeout { stage: "compiling context", after: timeout })?
            .map_err(|e| Error::Assembly(format!("{e:#}")))?;
        info!(passages = context.passages.len(), "context assembled");

        self.enter(Stage::Generating).await?;
        let conversation = build_conversation(&cfg.system_prompt, &request.messages, &context);
        let tokens = tokio::time::timeout(timeout, c.chat.stream_chat(&conversation))
            .await
            .map_err(|_| Error::Timeout { stage: "generating the answer", after: timeout })?
            .map_err(|e| Error::Generation(format!("{e:#}")))?;
        match stream::relay(tokens, self.sink, timeout).await? {
            RelayOutcome::Completed { fragments } => {
                debug!(fragments, "generation finished");
                Ok(())
            }
            RelayOutcome::SinkClosed => Err(Halt::SinkClosed),
        }
    }
}
