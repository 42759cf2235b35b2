//! A single multiplexed stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::info::{DataInfo, HeadersInfo, ReplyInfo};
use super::listener::{notify, StreamFrameListener};
use super::Session;
use crate::error::{Error, Result};
use crate::frame::{ControlFrame, HeadersFrame, SynReplyFrame};
use crate::version::Version;

/// One logical stream of a session.
///
/// Close state and the send window are atomics, so a `Stream` is shared
/// freely between the application and the session's flusher.
pub struct Stream {
    id: u32,
    version: Version,
    priority: u8,
    window: AtomicI32,
    local_closed: AtomicBool,
    remote_closed: AtomicBool,
    reset: AtomicBool,
    listener: RwLock<Option<Arc<dyn StreamFrameListener>>>,
    session: Weak<Session>,
}

impl Stream {
    pub(crate) fn new(
        id: u32,
        version: Version,
        priority: u8,
        window: i32,
        session: Weak<Session>,
        listener: Option<Arc<dyn StreamFrameListener>>,
    ) -> Self {
        Self {
            id,
            version,
            priority,
            window: AtomicI32::new(window),
            local_closed: AtomicBool::new(false),
            remote_closed: AtomicBool::new(false),
            reset: AtomicBool::new(false),
            listener: RwLock::new(listener),
            session,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Bytes this side may still send. May be negative after the peer
    /// shrinks the initial window.
    pub fn window_size(&self) -> i32 {
        self.window.load(Ordering::Acquire)
    }

    /// Both directions are closed.
    pub fn is_closed(&self) -> bool {
        self.is_local_closed() && self.is_remote_closed()
    }

    /// At least one direction is closed.
    pub fn is_half_closed(&self) -> bool {
        self.is_local_closed() || self.is_remote_closed()
    }

    pub fn is_local_closed(&self) -> bool {
        self.local_closed.load(Ordering::Acquire)
    }

    pub fn is_remote_closed(&self) -> bool {
        self.remote_closed.load(Ordering::Acquire)
    }

    /// The stream was terminated by RST_STREAM, sent or received.
    pub fn is_reset(&self) -> bool {
        self.reset.load(Ordering::Acquire)
    }

    /// The owning session, if it is still alive.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.upgrade()
    }

    /// Send a SYN_REPLY. A `close` reply half-closes the local side.
    pub fn reply(self: &Arc<Self>, info: ReplyInfo) -> Result<()> {
        let session = self.live_session()?;
        let frame = ControlFrame::SynReply(SynReplyFrame {
            version: self.version,
            flags: info.flags(),
            stream_id: self.id,
            headers: info.headers,
        });
        session.control(Some(self), frame)
    }

    /// Send a HEADERS frame.
    pub fn headers(self: &Arc<Self>, info: HeadersInfo) -> Result<()> {
        let session = self.live_session()?;
        let frame = ControlFrame::Headers(HeadersFrame {
            version: self.version,
            flags: info.flags(),
            stream_id: self.id,
            headers: info.headers,
        });
        session.control(Some(self), frame)
    }

    /// Queue data; it is written as the send window allows.
    pub fn data(self: &Arc<Self>, info: DataInfo) -> Result<()> {
        self.live_session()?.data(self, info)
    }

    fn live_session(&self) -> Result<Arc<Session>> {
        if self.is_local_closed() {
            return Err(Error::StreamClosed(self.id));
        }
        self.session.upgrade().ok_or(Error::SessionClosed)
    }

    /// Add `delta` to the send window and return the new size.
    ///
    /// A window that would leave the `i32` range is left untouched and an
    /// error is returned.
    pub(crate) fn update_window(&self, delta: i32) -> Result<i32> {
        let previous = self
            .window
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| w.checked_add(delta))
            .map_err(|w| {
                Error::protocol(format!(
                    "window of stream {} overflows: {} + {}",
                    self.id, w, delta
                ))
            })?;
        let window = previous + delta;
        tracing::debug!("Updated window of stream {} by {} to {}", self.id, delta, window);
        Ok(window)
    }

    pub(crate) fn close_local(&self) {
        self.local_closed.store(true, Ordering::Release);
    }

    pub(crate) fn close_remote(&self) {
        self.remote_closed.store(true, Ordering::Release);
    }

    pub(crate) fn mark_reset(&self) {
        self.reset.store(true, Ordering::Release);
    }

    pub(crate) fn set_listener(&self, listener: Option<Arc<dyn StreamFrameListener>>) {
        *self.listener.write() = listener;
    }

    fn listener(&self) -> Option<Arc<dyn StreamFrameListener>> {
        self.listener.read().clone()
    }

    pub(crate) fn process_reply(self: &Arc<Self>, info: ReplyInfo) {
        if info.close {
            self.close_remote();
        }
        if let Some(listener) = self.listener() {
            notify("reply", || listener.on_reply(self, &info));
        }
    }

    pub(crate) fn process_headers(self: &Arc<Self>, info: HeadersInfo) {
        if info.close {
            self.close_remote();
        }
        if let Some(listener) = self.listener() {
            notify("headers", || listener.on_headers(self, &info));
        }
    }

    pub(crate) fn process_data(self: &Arc<Self>, data: DataInfo) {
        if data.is_close() {
            self.close_remote();
        }
        if let Some(listener) = self.listener() {
            notify("data", || listener.on_data(self, &data));
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("window", &self.window_size())
            .field("local_closed", &self.is_local_closed())
            .field("remote_closed", &self.is_remote_closed())
            .field("reset", &self.is_reset())
            .finish()
    }
}
