//! Error types for the session layer.

use std::io;

use crate::frame::{SessionStatus, StreamStatus};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session and stream operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A locally-initiated stream could not be created (its id is consumed).
    #[error("Stream creation failed: {0}")]
    StreamCreation(String),

    /// The requested operation is not supported by this session.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The local side of the stream is already closed.
    #[error("Stream {0} is closed")]
    StreamClosed(u32),

    /// GOAWAY has been sent; no new streams may be opened.
    #[error("Session is closed")]
    SessionClosed,

    /// A frame could not be turned into bytes.
    #[error("Frame generation error: {0}")]
    Generation(String),

    /// The peer violated the framing protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid session configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a frame generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Stream-scoped failure reported by the parser.
///
/// The session answers it with a RST_STREAM carrying `status`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Stream {stream_id} error ({status:?}): {message}")]
pub struct StreamException {
    pub stream_id: u32,
    pub status: StreamStatus,
    pub message: String,
}

impl StreamException {
    pub fn new(stream_id: u32, status: StreamStatus, message: impl Into<String>) -> Self {
        Self {
            stream_id,
            status,
            message: message.into(),
        }
    }
}

/// Connection-scoped failure reported by the parser.
///
/// The session answers it with a GOAWAY carrying `status`, then closes.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Session error ({status:?}): {message}")]
pub struct SessionException {
    pub status: SessionStatus,
    pub message: String,
}

impl SessionException {
    pub fn new(status: SessionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
