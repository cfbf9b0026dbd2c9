//! Encoding of transcripts in the conversations table
//!
//! Rows are written as a JSON array of `{"role", "content"}` objects. Older
//! rows use a line format where each message starts with `user: ` or
//! `assistant: ` and following lines continue the previous message. Decoding
//! tries the structured format first and falls back to the line format.

use crate::error::Result;
use crate::types::{Message, Transcript, TranscriptFormat};

/// A stored row decoded into a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTranscript {
    pub format: TranscriptFormat,
    pub transcript: Transcript,
}

/// Why a row could not be decoded by either format
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The column was empty
    #[error("empty transcript column")]
    Empty,
    /// Neither decoder accepted the text
    #[error("not a structured transcript ({structured_error}) and no valid legacy role lines")]
    Unrecognized { structured_error: String },
}

/// Serialize a transcript for storage, dropping system messages
pub fn encode(transcript: &Transcript) -> Result<String> {
    Ok(serde_json::to_string(&transcript.without_system())?)
}

/// Decode a stored row, structured format first
pub fn decode(raw: &str) -> std::result::Result<DecodedTranscript, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let structured_error = match serde_json::from_str::<Vec<Message>>(raw) {
        Ok(messages) => {
            return Ok(DecodedTranscript {
                format: TranscriptFormat::Structured,
                transcript: messages.into_iter().filter(|m| !m.is_system()).collect(),
            });
        }
        Err(e) => e.to_string(),
    };

    match decode_legacy(raw) {
        Some(transcript) => Ok(DecodedTranscript {
            format: TranscriptFormat::Legacy,
            transcript,
        }),
        None => Err(DecodeError::Unrecognized { structured_error }),
    }
}

/// Parse the line format
///
/// `None` when no line opens a message, or when a role line lacks the `": "`
/// separator before its text.
fn decode_legacy(raw: &str) -> Option<Transcript> {
    let mut messages = Vec::new();
    let mut current: Option<(fn(String) -> Message, Vec<String>)> = None;

    for line in raw.split('\n') {
        let make: Option<fn(String) -> Message> = if line.starts_with("user:") {
            Some(Message::User)
        } else if line.starts_with("assistant:") {
            Some(Message::Assistant)
        } else {
            None
        };

        match make {
            Some(make) => {
                let (_, rest) = line.split_once(": ")?;
                if let Some((prev, lines)) = current.take() {
                    messages.push(prev(lines.join("\n").trim().to_string()));
                }
                current = Some((make, vec![rest.to_string()]));
            }
            None => {
                // Text before the first role line has no owner and is dropped
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line.trim().to_string());
                }
            }
        }
    }

    if let Some((prev, lines)) = current {
        messages.push(prev(lines.join("\n").trim().to_string()));
    }

    (!messages.is_empty()).then(|| Transcript::from(messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        vec![
            Message::system("You are a plant engineer."),
            Message::assistant("Hi, I'm here to help."),
            Message::user("What tolerance does the lathe hold?"),
            Message::assistant("Around 0.02mm on diameters.\nTighter with grinding."),
        ]
        .into()
    }

    #[test]
    fn test_encode_strips_system() {
        let encoded = encode(&sample()).unwrap();
        assert!(!encoded.contains("plant engineer"));
        assert!(encoded.starts_with(r#"[{"role":"assistant""#));
    }

    #[test]
    fn test_structured_round_trip() {
        let decoded = decode(&encode(&sample()).unwrap()).unwrap();
        assert_eq!(decoded.format, TranscriptFormat::Structured);
        assert_eq!(decoded.transcript, sample().without_system());
    }

    #[test]
    fn test_legacy_multiline() {
        let raw = "assistant: Hi there\nuser: How often is the die replaced?\nIt looks worn.\nassistant: Every 50k strokes.";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.format, TranscriptFormat::Legacy);
        assert_eq!(
            decoded.transcript.messages(),
            &[
                Message::assistant("Hi there"),
                Message::user("How often is the die replaced?\nIt looks worn."),
                Message::assistant("Every 50k strokes."),
            ]
        );
    }

    #[test]
    fn test_legacy_role_line_needs_separator() {
        assert!(matches!(
            decode("assistant: Hello\nuser:no space"),
            Err(DecodeError::Unrecognized { .. })
        ));

        // Text starts after the first separator on the line
        let decoded = decode("user: Why: cost?").unwrap();
        assert_eq!(decoded.transcript.messages(), &[Message::user("Why: cost?")]);
    }

    #[test]
    fn test_decode_error_message() {
        let err = decode("").unwrap_err();
        assert_eq!(err.to_string(), "empty transcript column");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            decode("garbage-not-json"),
            Err(DecodeError::Unrecognized { .. })
        ));
        assert_eq!(decode("   "), Err(DecodeError::Empty));
    }

    #[test]
    fn test_structured_with_unknown_role_falls_through() {
        let raw = r#"[{"role":"tool","content":"x"}]"#;
        assert!(decode(raw).is_err());
    }
}
