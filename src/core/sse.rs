//! Server-Sent Events decoding for streamed completions.
//!
//! Only the `data` field matters to chat-completion streams. Each finished
//! event yields its data payload; the `[DONE]` sentinel ends the stream.

use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};

use super::error::LlmError;

pub const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder that turns raw response bytes into event payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every payload completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.process_line(line.trim_end_matches('\r')) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush whatever is left once the byte stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = self.buffer.split();
            let line = String::from_utf8_lossy(&rest);
            if let Some(payload) = self.process_line(line.trim_end_matches('\r')) {
                return Some(payload);
            }
        }
        self.data.take()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.data.take();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }

        None
    }
}

/// Decode an SSE response body into its data payloads, stopping at `[DONE]`.
pub fn data_stream(response: reqwest::Response) -> impl Stream<Item = Result<String, LlmError>> {
    async_stream::try_stream! {
        let mut decoder = SseDecoder::new();
        let mut bytes = response.bytes_stream();

        'read: while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| LlmError::Network {
                message: "Stream read error".to_string(),
                source: Box::new(e),
            })?;

            for payload in decoder.push(&chunk) {
                if payload == DONE_MARKER {
                    break 'read;
                }
                yield payload;
            }
        }

        if let Some(payload) = decoder.finish() {
            if payload != DONE_MARKER {
                yield payload;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_complete_on_blank_line() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"a\":1}\n").is_empty());
        assert_eq!(decoder.push(b"\n"), vec![r#"{"a":1}"#.to_string()]);
    }

    #[test]
    fn lines_split_across_chunks_are_reassembled() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        assert_eq!(decoder.push(b"lo\r\n\r\n"), vec!["hello".to_string()]);
    }

    #[test]
    fn split_utf8_sequence_decodes() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: héllo\n\n".as_bytes();
        let (head, tail) = bytes.split_at(8);

        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["héllo".to_string()]);
    }

    #[test]
    fn comments_and_other_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keep-alive\n\nevent: message\nid: 4\ndata: x\n\n");

        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: one\ndata: two\n\n");

        assert_eq!(payloads, vec!["one\ntwo".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }
}
