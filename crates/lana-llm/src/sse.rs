//! SSE payload decoder for the OpenRouter stream.
//!
//! The chat-completions endpoint streams Server-Sent Events as raw bytes.
//! This module turns that byte stream into discrete `data:` payload
//! strings:
//!
//! - incomplete trailing lines are buffered until later bytes complete them
//! - comments (`:`), empty lines, and non-`data` fields are skipped
//! - the `[DONE]` sentinel and empty payloads are filtered out
//!
//! Transport read errors end the stream with a warn log; the decoder never
//! retries.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

/// Decoder options.
#[derive(Clone, Debug)]
pub struct SseDecoderOptions {
    /// Whether a non-empty trailing buffer is flushed as a final payload
    /// when the stream ends without a terminating newline. OpenRouter ends
    /// with an explicit `[DONE]`, so the default is `false`.
    pub flush_trailing: bool,
}

impl Default for SseDecoderOptions {
    fn default() -> Self {
        Self {
            flush_trailing: false,
        }
    }
}

/// Decode SSE `data:` payloads from a byte stream.
///
/// Lazy: bytes are only pulled from `byte_stream` when the caller polls
/// and the buffer holds no complete line.
pub fn sse_payloads<S>(
    byte_stream: S,
    options: &SseDecoderOptions,
) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let flush_trailing = options.flush_trailing;

    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                // Drain complete lines from the buffer first.
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    let line = match std::str::from_utf8(&line_bytes) {
                        Ok(s) => s,
                        Err(_) => continue, // skip invalid UTF-8 lines
                    };

                    if let Some(payload) = extract_data_payload(line) {
                        return Some((payload, (stream, buffer, false)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        warn!("SSE stream read error: {e}");
                        return None;
                    }
                    None => {
                        // A partial line may be left behind when the
                        // upstream closes mid-event.
                        if flush_trailing && !buffer.is_empty() {
                            let line = match std::str::from_utf8(&buffer) {
                                Ok(s) => s.trim(),
                                Err(_) => return None,
                            };
                            if let Some(payload) = extract_data_payload(line) {
                                buffer.clear();
                                return Some((payload, (stream, buffer, true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract the payload from a single SSE line.
///
/// Returns `None` for comments, empty lines, non-`data` fields, empty
/// payloads, and the `[DONE]` sentinel.
fn extract_data_payload(line: &str) -> Option<String> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let payload = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?;
    let payload = payload.trim();

    if payload == "[DONE]" || payload.is_empty() {
        return None;
    }

    Some(payload.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
