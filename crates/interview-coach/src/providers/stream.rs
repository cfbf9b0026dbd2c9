//! Line framing for streamed provider responses
//!
//! Both backends stream newline-delimited records (NDJSON for Ollama, SSE for
//! OpenAI). Network chunks do not respect line boundaries, so bytes are
//! buffered until a full line is available.

use futures_util::{Stream, StreamExt};
use std::fmt::Display;

use crate::error::{Error, Result};

/// Splits a byte stream into complete lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            let text = text.trim_end_matches('\r');
            if !text.trim().is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Remaining partial line once the stream has ended
    pub fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buffer).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// What a parsed line contributes to the reply
#[derive(Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Text to append
    Text(String),
    /// Record carried nothing to append
    Empty,
    /// The provider signalled the end of the reply, with any trailing text
    Done(String),
}

/// Drain a byte stream, parsing each line and concatenating the text fragments
///
/// Returns once a `Done` record arrives. A stream that ends without one was
/// cut off, and the partial reply is discarded as an error.
pub async fn accumulate<S, B, E, F>(stream: S, mut parse_line: F) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str) -> Result<Fragment>,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = LineDecoder::new();
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| Error::llm(format!("Stream error: {}", e)))?;
        for line in decoder.push(bytes.as_ref()) {
            match parse_line(&line)? {
                Fragment::Text(text) => reply.push_str(&text),
                Fragment::Empty => {}
                Fragment::Done(tail) => {
                    reply.push_str(&tail);
                    return Ok(reply);
                }
            }
        }
    }

    if let Some(line) = decoder.finish() {
        if let Fragment::Done(tail) = parse_line(&line)? {
            reply.push_str(&tail);
            return Ok(reply);
        }
    }

    Err(Error::llm(format!(
        "Stream ended before the reply was complete ({} chars received)",
        reply.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"a\":").is_empty());
        assert_eq!(decoder.push(b"1}\n{\"b\""), vec!["{\"a\":1}"]);
        assert_eq!(decoder.push(b":2}\r\n\n"), vec!["{\"b\":2}"]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_multibyte_char_split() {
        let text = "é\n".as_bytes();
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&text[..1]).is_empty());
        assert_eq!(decoder.push(&text[1..]), vec!["é"]);
    }

    #[tokio::test]
    async fn test_accumulate_stops_at_done() {
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![
            Ok(&b"Hel\nlo\n"[..]),
            Ok(&b"DONE\nignored\n"[..]),
        ];
        let reply = accumulate(stream::iter(chunks), |line| {
            Ok(match line {
                "DONE" => Fragment::Done(String::new()),
                other => Fragment::Text(other.to_string()),
            })
        })
        .await
        .unwrap();
        assert_eq!(reply, "Hello");
    }

    fn until_end(line: &str) -> Result<Fragment> {
        Ok(match line.strip_prefix("END ") {
            Some(tail) => Fragment::Done(tail.to_string()),
            None => Fragment::Text(line.to_string()),
        })
    }

    #[test]
    fn test_accumulate_flushes_unterminated_line() {
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![Ok(&b"a\nEND b"[..])];
        let reply = tokio_test::block_on(accumulate(stream::iter(chunks), until_end)).unwrap();
        assert_eq!(reply, "ab");
    }

    #[tokio::test]
    async fn test_accumulate_rejects_truncated_stream() {
        let chunks: Vec<std::result::Result<&[u8], String>> = vec![Ok(&b"Partial\nreply"[..])];
        let err = accumulate(stream::iter(chunks), until_end).await.unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("ended before")));
    }

    #[tokio::test]
    async fn test_accumulate_propagates_transport_error() {
        let chunks: Vec<std::result::Result<&[u8], String>> =
            vec![Ok(&b"partial\n"[..]), Err("connection reset".to_string())];
        let err = accumulate(stream::iter(chunks), |line| Ok(Fragment::Text(line.to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(msg) if msg.contains("connection reset")));
    }
}
