//! Incremental SSE decoder for chat-completions streams.
//!
//! Bytes arrive in arbitrary chunks. They are buffered raw and only
//! decoded once a full `\n`-terminated line is available, so the output
//! does not depend on where the chunks were split (including splits in
//! the middle of a multi-byte character).
//!
//! Recognised lines:
//! - `data: [DONE]` ends the stream; anything buffered after it is dropped
//! - `data: {...}` yields `choices[0].delta.content`
//! - everything else (comments, `event:`, blank lines) is ignored

use serde_json::Value;

use crate::error::DecodeError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Text carried by one streamed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment(String);

impl ContentFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Classification of a single SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with its delta content (possibly empty).
    Content(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Not a `data: ` line.
    Ignored,
}

/// Classify one line (without its trailing `\n`).
///
/// A trailing `\r` is tolerated so CRLF streams behave like LF streams.
pub fn parse_sse_line(line: &str) -> Result<SseEvent, DecodeError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(SseEvent::Ignored);
    };

    if payload == DONE_SENTINEL {
        return Ok(SseEvent::Done);
    }

    let json: Value =
        serde_json::from_str(payload).map_err(|source| DecodeError::InvalidJson { source })?;

    let delta = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .ok_or(DecodeError::MissingContent)?;

    match delta.get("content") {
        None | Some(Value::Null) => Ok(SseEvent::Content(String::new())),
        Some(Value::String(text)) => Ok(SseEvent::Content(text.clone())),
        Some(_) => Err(DecodeError::UnexpectedContent),
    }
}

/// Stateful decoder for one response body.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
    parse_errors: u64,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return the fragments of every line completed by them.
    ///
    /// Once the sentinel has been seen this returns nothing and keeps
    /// nothing.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ContentFragment> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.decode_line(&line[..line.len() - 1], &mut fragments);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        fragments
    }

    /// Decode whatever is left after EOF as a final line, then drop the buffer.
    pub fn finish(&mut self) -> Vec<ContentFragment> {
        let rest = std::mem::take(&mut self.buffer);
        let mut fragments = Vec::new();
        if !self.done && !rest.is_empty() {
            self.decode_line(&rest, &mut fragments);
        }
        fragments
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Lines skipped because they could not be decoded.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// Bytes held waiting for a newline.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn decode_line(&mut self, line: &[u8], out: &mut Vec<ContentFragment>) {
        if !line.starts_with(DATA_PREFIX.as_bytes()) {
            return;
        }

        let result = std::str::from_utf8(line)
            .map_err(|source| DecodeError::InvalidUtf8 { source })
            .and_then(parse_sse_line);

        match result {
            Ok(SseEvent::Content(text)) => {
                if !text.is_empty() {
                    out.push(ContentFragment(text));
                }
            }
            Ok(SseEvent::Done) => {
                tracing::debug!("stream sentinel received");
                self.done = true;
            }
            Ok(SseEvent::Ignored) => {}
            Err(err) => {
                self.parse_errors += 1;
                tracing::warn!(
                    error_type = err.error_type(),
                    error = %err,
                    line_len = line.len(),
                    "skipping undecodable SSE line"
                );
            }
        }
    }
}
