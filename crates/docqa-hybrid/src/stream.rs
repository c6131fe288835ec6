//! Relays a model's token stream into the caller's event channel.

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

use docqa_core::traits::TokenStream;
use docqa_core::types::PipelineEvent;
use docqa_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { fragments: usize },
    /// The receiver was dropped; the rest of the stream was discarded.
    SinkClosed,
}

/// Forward every non-empty fragment as a content event. Each fragment must
/// arrive within `idle` of the previous one.
pub async fn relay(
    mut tokens: TokenStream,
    sink: &mpsc::Sender<PipelineEvent>,
    idle: Duration,
) -> Result<RelayOutcome, Error> {
    let mut fragments = 0;
    loop {
        let next = tokio::time::timeout(idle, tokens.next())
            .await
            .map_err(|_| Error::Timeout { stage: "generating the answer", after: idle })?;
        match next {
            None => return Ok(RelayOutcome::Completed { fragments }),
            Some(Err(e)) => return Err(Error::Generation(format!("{e:#}"))),
            Some(Ok(fragment)) => {
                if fragment.is_empty() { continue; }
                if sink.send(PipelineEvent::content(fragment)).await.is_err() {
                    return Ok(RelayOutcome::SinkClosed);
                }
                fragments += 1;
            }
        }
    }
}
