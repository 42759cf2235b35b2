//! Session configuration.
//!
//! # Usage
//!
//! ```rust
//! use spdy_session::{SessionConfig, Version};
//!
//! // Client side: odd stream ids
//! let config = SessionConfig::client();
//!
//! // Server side speaking SPDY/2 with a smaller frame size
//! let config = SessionConfig::server()
//!     .version(Version::V2)
//!     .max_data_frame_size(4096);
//! assert_eq!(config.initial_stream_id, 2);
//! ```

use crate::codec::DEFAULT_MAX_DATA_FRAME_SIZE;
use crate::error::{Error, Result};
use crate::frame::{DEFAULT_WINDOW_SIZE, MAX_FRAME_LENGTH};
use crate::version::Version;

/// Parameters fixed for the lifetime of a session.
///
/// The initial stream id decides which side of the connection the session
/// plays: odd for the client, even for the server. Ping ids use the same
/// parity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Version used for frames the session originates on its own
    /// (exception replies, transport helpers).
    ///
    /// Default: SPDY/3
    pub version: Version,

    /// First locally allocated stream id, 1 (client) or 2 (server).
    pub initial_stream_id: u32,

    /// Send window of new streams until the peer's SETTINGS say otherwise.
    ///
    /// Default: 65536
    pub initial_window_size: i32,

    /// Upper bound on the payload of one generated DATA frame.
    ///
    /// Default: 16384
    pub max_data_frame_size: usize,
}

impl SessionConfig {
    /// Client preset: odd stream ids.
    pub fn client() -> Self {
        Self {
            version: Version::V3,
            initial_stream_id: 1,
            initial_window_size: DEFAULT_WINDOW_SIZE,
            max_data_frame_size: DEFAULT_MAX_DATA_FRAME_SIZE,
        }
    }

    /// Server preset: even stream ids.
    pub fn server() -> Self {
        Self {
            initial_stream_id: 2,
            ..Self::client()
        }
    }

    /// Set the protocol version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the initial per-stream send window.
    pub fn initial_window_size(mut self, size: i32) -> Self {
        self.initial_window_size = size;
        self
    }

    /// Set the maximum DATA frame payload.
    pub fn max_data_frame_size(mut self, size: usize) -> Self {
        self.max_data_frame_size = size;
        self
    }

    /// Whether stream `id` was allocated by this side.
    pub fn is_local_stream(&self, id: u32) -> bool {
        id % 2 == self.initial_stream_id % 2
    }

    /// Check the invariants the session relies on.
    pub fn validate(&self) -> Result<()> {
        if self.initial_stream_id != 1 && self.initial_stream_id != 2 {
            return Err(Error::config(format!(
                "initial stream id must be 1 or 2, got {}",
                self.initial_stream_id
            )));
        }
        if self.initial_window_size <= 0 {
            return Err(Error::config(format!(
                "initial window size must be positive, got {}",
                self.initial_window_size
            )));
        }
        if self.max_data_frame_size == 0 || self.max_data_frame_size > MAX_FRAME_LENGTH {
            return Err(Error::config(format!(
                "max data frame size must be in 1..={}, got {}",
                MAX_FRAME_LENGTH, self.max_data_frame_size
            )));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::client()
    }
}
