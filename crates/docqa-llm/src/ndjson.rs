//! Decoding of Ollama's newline-delimited JSON chat stream.
//!
//! Network chunks split lines (and multi-byte characters) at arbitrary byte
//! offsets, so bytes are buffered until a full line is available and only
//! then decoded as UTF-8.

use anyhow::{anyhow, Context};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;

use docqa_core::traits::TokenStream;

#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buf: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self { Self::default() }

    /// Append `bytes` and return every line completed by them, without the newline.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') { line.pop(); }
            lines.push(line);
        }
        lines
    }

    /// Whatever is left once the input has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buf);
        if rest.iter().all(u8::is_ascii_whitespace) { None } else { Some(rest) }
    }
}

#[derive(Deserialize)]
struct ChatLine {
    #[serde(default)]
    message: Option<LineMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct LineMessage {
    #[serde(default)]
    content: String,
}

struct Decoded {
    content: Option<String>,
    done: bool,
}

fn decode_line(line: &[u8]) -> anyhow::Result<Option<Decoded>> {
    let text = std::str::from_utf8(line).context("stream line is not valid UTF-8")?;
    if text.trim().is_empty() { return Ok(None); }
    let parsed: ChatLine = serde_json::from_str(text).with_context(|| format!("malformed stream line: {text}"))?;
    if let Some(error) = parsed.error {
        return Err(anyhow!("model error: {error}"));
    }
    let content = parsed.message.map(|m| m.content).filter(|c| !c.is_empty());
    Ok(Some(Decoded { content, done: parsed.done }))
}

struct State<S> {
    inner: S,
    decoder: NdjsonDecoder,
    pending: VecDeque<anyhow::Result<String>>,
    done: bool,
}

impl<S> State<S> {
    fn accept(&mut self, line: &[u8]) {
        if self.done { return; }
        match decode_line(line) {
            Ok(Some(decoded)) => {
                if let Some(content) = decoded.content { self.pending.push_back(Ok(content)); }
                if decoded.done { self.done = true; }
            }
            Ok(None) => {}
            Err(e) => {
                self.pending.push_back(Err(e));
                self.done = true;
            }
        }
    }
}

/// Turn a raw byte stream of Ollama `/api/chat` output into answer fragments.
///
/// The stream ends after the `done` line, at end of input, or right after the
/// first error it yields.
pub fn decode_chat_stream<S, E>(inner: S) -> TokenStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = State { inner: Box::pin(inner), decoder: NdjsonDecoder::new(), pending: VecDeque::new(), done: false };
    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() { st.pending.clear(); }
                return Some((item, st));
            }
            if st.done { return None; }
            match st.inner.next().await {
                Some(Ok(bytes)) => {
                    for line in st.decoder.push(&bytes) { st.accept(&line); }
                }
                Some(Err(e)) => {
                    st.pending.push_back(Err(anyhow::Error::new(e).context("model stream interrupted")));
                    st.done = true;
                }
                None => {
                    if let Some(rest) = st.decoder.finish() { st.accept(&rest); }
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_splits_lines_across_pushes() {
        let mut d = NdjsonDecoder::new();
        assert!(d.push(b"{\"a\":").is_empty());
        let lines = d.push(b"1}\r\n{\"b\":2}\n{\"c\"");
        assert_eq!(lines, vec![b"{\"a\":1}".to_vec(), b"{\"b\":2}".to_vec()]);
        assert_eq!(d.finish(), Some(b"{\"c\"".to_vec()));
        assert_eq!(d.finish(), None);
    }

    #[test]
    fn blank_and_contentless_lines_produce_nothing() {
        assert!(decode_line(b"   ").unwrap().is_none());
        let d = decode_line(br#"{"message":{"role":"assistant","content":""},"done":true}"#).unwrap().unwrap();
        assert!(d.content.is_none());
        assert!(d.done);
    }

    #[test]
    fn error_lines_are_errors() {
        assert!(decode_line(br#"{"error":"model not found"}"#).is_err());
        assert!(decode_line(b"not json").is_err());
    }
}
