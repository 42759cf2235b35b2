//! # spdy-session
//!
//! Session layer for a SPDY-style multiplexed framed protocol.
//!
//! One connection carries many streams, each with its own lifecycle and
//! flow-control window, while SETTINGS, PING and GOAWAY apply to the whole
//! connection. The [`Session`] is transport-agnostic: it generates frames
//! through a [`Generator`], writes them through a [`Controller`], and
//! consumes inbound frames as a [`ParserListener`].
//!
//! The [`codec`] module ships the default SPDY/2 and SPDY/3 wire codec and
//! [`transport`] binds a session to a tokio socket.

// Protocol model
pub mod error;
pub mod frame;
pub mod headers;
pub mod version;

// Wire codec
pub mod codec;

// Session engine
pub mod config;
pub mod session;

// Async transport
pub mod transport;

// Re-exports
pub use codec::{Generator, Parser, ParserListener, StandardGenerator};
pub use config::SessionConfig;
pub use error::{Error, Result, SessionException, StreamException};
pub use frame::{SessionStatus, Setting, SettingId, StreamStatus};
pub use headers::Headers;
pub use session::{
    ControlListener, Controller, DataInfo, GoAwayInfo, HeadersInfo, PingInfo, ReplyInfo, RstInfo,
    Session, SessionFrameListener, SettingsInfo, Stream, StreamFrameListener, StreamListener,
    SynInfo, WriteHandler,
};
pub use version::Version;
