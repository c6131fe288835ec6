//! HTTP surface: `POST /api/chat` answers as Server-Sent Events, one JSON
//! event per pipeline event; `GET /health` for liveness.

use anyhow::Result;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde_json::Value;
use std::convert::Infallible;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use docqa_core::types::AskRequest;
use docqa_hybrid::Pipeline;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

pub fn router(pipeline: Pipeline) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

pub async fn serve(pipeline: Pipeline, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "docqa server listening");
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

async fn chat_handler(
    State(pipeline): State<Pipeline>,
    Json(request): Json<AskRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = pipeline.spawn(request);
    let stream = ReceiverStream::new(rx).map(|event| -> Result<Event, Infallible> {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data(r#"{"error":"unserializable event"}"#)))
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}

async fn health_handler() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "docqa-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
