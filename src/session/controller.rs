//! The session's view of the physical connection.

use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;

use super::queue::FrameUnit;
use super::Session;

/// Performs physical writes for a session.
///
/// At most one write is outstanding at a time. The implementation must call
/// exactly one of [`WriteHandler::complete`] or [`WriteHandler::failed`] per
/// write, either synchronously from `write` or later from any thread.
pub trait Controller: Send + Sync {
    fn write(&self, bytes: Bytes, handler: WriteHandler);

    /// Close the connection. A graceful close lets already-submitted writes
    /// reach the peer first.
    fn close(&self, graceful: bool);
}

/// Completion callback for one [`Controller::write`].
#[must_use = "the session stalls until the write is completed or failed"]
pub struct WriteHandler {
    session: Arc<Session>,
    unit: FrameUnit,
}

impl WriteHandler {
    pub(crate) fn new(session: Arc<Session>, unit: FrameUnit) -> Self {
        Self { session, unit }
    }

    /// The bytes were written.
    pub fn complete(self) {
        self.session.write_completed(self.unit);
    }

    /// The write failed; the session gives up on the connection.
    pub fn failed(self, error: io::Error) {
        self.session.write_failed(self.unit, error);
    }
}

impl fmt::Debug for WriteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHandler").field("unit", &self.unit).finish()
    }
}
