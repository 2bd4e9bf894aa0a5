//! Error types for the streaming pipeline.
//!
//! Only [`SessionError`] ever leaves a session. Decode and draw failures
//! are logged where they happen and the pipeline moves on.

use thiserror::Error;

/// A `data:` line that could not be turned into a content fragment.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line bytes were not valid UTF-8.
    #[error("line is not valid UTF-8: {source}")]
    InvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },

    /// The payload after `data: ` was not valid JSON.
    #[error("payload is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    /// The payload has no `choices[0].delta` object.
    #[error("payload has no choices[0].delta")]
    MissingContent,

    /// `choices[0].delta.content` exists but is not a string.
    #[error("delta content is not a string")]
    UnexpectedContent,
}

impl DecodeError {
    /// Short label used in log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            DecodeError::InvalidUtf8 { .. } => "invalid_utf8",
            DecodeError::InvalidJson { .. } => "invalid_json",
            DecodeError::MissingContent => "missing_content",
            DecodeError::UnexpectedContent => "unexpected_content",
        }
    }
}

/// The display surface rejected a draw or clear call.
#[derive(Debug, Error)]
pub enum DrawError {
    /// The target cell lies outside the panel.
    #[error("cell ({x}, {y}) is outside the panel")]
    OutOfBounds { x: u32, y: u32 },

    /// The device reported a failure.
    #[error("display device error: {0}")]
    Device(String),

    /// Writing to the underlying terminal failed.
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures that end a session. The user sees these as a rendered message.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The HTTP client could not be built or the request could not be sent.
    #[error("connection failed: {source}")]
    Connect {
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reading the response body failed mid-stream.
    #[error("stream read failed: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// No API key was configured.
    #[error("no API key configured (set request.api_key or CHATPANE_API_KEY)")]
    MissingApiKey,
}

impl SessionError {
    /// Short label used in log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            SessionError::Connect { .. } => "connect_error",
            SessionError::Status { .. } => "status_error",
            SessionError::Read { .. } => "read_error",
            SessionError::MissingApiKey => "missing_api_key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_labels() {
        assert_eq!(DecodeError::MissingContent.error_type(), "missing_content");
        let err = serde_json::from_str::<serde_json::Value>("{not json}").unwrap_err();
        assert_eq!(
            DecodeError::InvalidJson { source: err }.error_type(),
            "invalid_json"
        );
    }

    #[test]
    fn session_error_display() {
        let err = SessionError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 401: unauthorized");
        assert_eq!(err.error_type(), "status_error");
    }

    #[test]
    fn draw_error_from_io() {
        let err: DrawError = std::io::Error::other("broken pipe").into();
        assert!(matches!(err, DrawError::Io(_)));
    }
}
