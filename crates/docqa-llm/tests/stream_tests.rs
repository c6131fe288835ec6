use bytes::Bytes;
use futures::StreamExt;

use docqa_llm::decode_chat_stream;

fn chunks(parts: Vec<Vec<u8>>) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    futures::stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
}

async fn collect(stream: docqa_core::traits::TokenStream) -> (Vec<String>, Vec<String>) {
    let items: Vec<anyhow::Result<String>> = stream.collect().await;
    let mut ok = Vec::new();
    let mut err = Vec::new();
    for item in items {
        match item {
            Ok(s) => ok.push(s),
            Err(e) => err.push(format!("{e:#}")),
        }
    }
    (ok, err)
}

#[tokio::test]
async fn fragments_survive_line_and_utf8_splits() {
    let body = concat!(
        "{\"message\":{\"role\":\"assistant\",\"content\":\"Revenue \"},\"done\":false}\n",
        "{\"message\":{\"role\":\"assistant\",\"content\":\"grew 12%, h\u{e9}h\"},\"done\":false}\n",
        "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
    )
    .as_bytes()
    .to_vec();
    // cut inside the two-byte 'é' and in the middle of the first line
    let cut_utf8 = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let parts = vec![body[..20].to_vec(), body[20..cut_utf8].to_vec(), body[cut_utf8..].to_vec()];

    let (ok, err) = collect(decode_chat_stream(chunks(parts))).await;
    assert!(err.is_empty(), "{err:?}");
    assert_eq!(ok.concat(), "Revenue grew 12%, héh");
}

#[tokio::test]
async fn stream_stops_at_done_line() {
    let body = b"{\"message\":{\"content\":\"a\"},\"done\":false}\n{\"message\":{\"content\":\"b\"},\"done\":true}\n{\"message\":{\"content\":\"ignored\"},\"done\":false}\n".to_vec();
    let (ok, err) = collect(decode_chat_stream(chunks(vec![body]))).await;
    assert!(err.is_empty());
    assert_eq!(ok, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn trailing_line_without_newline_is_decoded() {
    let body = b"{\"message\":{\"content\":\"tail\"},\"done\":true}".to_vec();
    let (ok, _) = collect(decode_chat_stream(chunks(vec![body]))).await;
    assert_eq!(ok, vec!["tail".to_string()]);
}

#[tokio::test]
async fn model_error_line_ends_stream_with_one_error() {
    let body = b"{\"message\":{\"content\":\"par\"},\"done\":false}\n{\"error\":\"out of memory\"}\n{\"message\":{\"content\":\"never\"}}\n".to_vec();
    let (ok, err) = collect(decode_chat_stream(chunks(vec![body]))).await;
    assert_eq!(ok, vec!["par".to_string()]);
    assert_eq!(err.len(), 1);
    assert!(err[0].contains("out of memory"));
}

#[tokio::test]
async fn transport_error_is_surfaced_once() {
    let parts: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"x\"},\"done\":false}\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"y\"},\"done\":true}\n")),
    ];
    let (ok, err) = collect(decode_chat_stream(futures::stream::iter(parts))).await;
    assert_eq!(ok, vec!["x".to_string()]);
    assert_eq!(err.len(), 1);
    assert!(err[0].contains("interrupted"));
}
