//! Tokio transport binding.
//!
//! Runs a [`Session`](crate::Session) over any `AsyncRead + AsyncWrite`
//! socket: a writer task implements the session's
//! [`Controller`](crate::Controller), and a reader task feeds the parser.
//!
//! ## Usage
//!
//! ```no_run
//! use spdy_session::transport::Connection;
//! use spdy_session::{Headers, SessionConfig, SynInfo, Version};
//!
//! # async fn example() -> spdy_session::Result<()> {
//! let (socket, _peer) = tokio::io::duplex(64 * 1024);
//! let connection = Connection::start(socket, SessionConfig::client(), None)?;
//! let headers: Headers = [(":method", "GET"), (":path", "/")].into_iter().collect();
//! let stream = connection
//!     .session()
//!     .syn(Version::V3, SynInfo::new(headers, true), None)?;
//! # let _ = stream;
//! # Ok(())
//! # }
//! ```

mod connection;
mod driver;

pub use connection::Connection;
pub use driver::{IoController, WriterCommand, READ_BUFFER_SIZE};
