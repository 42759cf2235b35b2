//! Listener traits and the session's listener registry.
//!
//! Every notification runs outside the session locks, and a panicking
//! listener is caught and logged so that one bad listener neither breaks the
//! session nor stops the remaining listeners from being notified.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use super::info::{
    DataInfo, GoAwayInfo, HeadersInfo, PingInfo, ReplyInfo, RstInfo, SettingsInfo, SynInfo,
};
use super::stream::Stream;
use super::Session;

/// Stream lifecycle notifications.
pub trait StreamListener: Send + Sync {
    fn on_stream_created(&self, _stream: &Arc<Stream>) {}

    fn on_stream_closed(&self, _stream: &Arc<Stream>) {}
}

/// Session-wide control frame notifications.
pub trait ControlListener: Send + Sync {
    fn on_rst(&self, _session: &Arc<Session>, _info: &RstInfo) {}

    fn on_settings(&self, _session: &Arc<Session>, _info: &SettingsInfo) {}

    /// A PING we sent came back.
    fn on_ping(&self, _session: &Arc<Session>, _info: &PingInfo) {}

    fn on_go_away(&self, _session: &Arc<Session>, _info: &GoAwayInfo) {}
}

/// The session's primary listener.
///
/// Receives the control notifications and decides how to handle each stream
/// the peer opens.
pub trait SessionFrameListener: ControlListener {
    /// The peer opened `stream`. The returned listener receives the stream's
    /// subsequent frames.
    fn on_syn(&self, _stream: &Arc<Stream>, _info: &SynInfo) -> Option<Arc<dyn StreamFrameListener>> {
        None
    }
}

/// Per-stream frame notifications.
pub trait StreamFrameListener: Send + Sync {
    fn on_reply(&self, _stream: &Arc<Stream>, _info: &ReplyInfo) {}

    fn on_headers(&self, _stream: &Arc<Stream>, _info: &HeadersInfo) {}

    fn on_data(&self, _stream: &Arc<Stream>, _data: &DataInfo) {}
}

/// Run a listener callback, logging instead of propagating a panic.
pub(crate) fn notify<R>(what: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(panic) => {
            tracing::info!("Exception while notifying {}: {}", what, panic_message(&*panic));
            None
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".to_string()
    }
}

/// Registered stream and control listeners.
///
/// Notification iterates over a snapshot, so listeners may add or remove
/// listeners from inside a callback.
#[derive(Default)]
pub(crate) struct Listeners {
    stream: RwLock<Vec<Arc<dyn StreamListener>>>,
    control: RwLock<Vec<Arc<dyn ControlListener>>>,
}

impl Listeners {
    pub(crate) fn add_stream(&self, listener: Arc<dyn StreamListener>) {
        self.stream.write().push(listener);
    }

    pub(crate) fn remove_stream(&self, listener: &Arc<dyn StreamListener>) -> bool {
        let mut list = self.stream.write();
        match list.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn add_control(&self, listener: Arc<dyn ControlListener>) {
        self.control.write().push(listener);
    }

    pub(crate) fn remove_control(&self, listener: &Arc<dyn ControlListener>) -> bool {
        let mut list = self.control.write();
        match list.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn stream_listeners(&self) -> Vec<Arc<dyn StreamListener>> {
        self.stream.read().clone()
    }

    pub(crate) fn control_listeners(&self) -> Vec<Arc<dyn ControlListener>> {
        self.control.read().clone()
    }

    pub(crate) fn stream_created(&self, stream: &Arc<Stream>) {
        for listener in self.stream_listeners() {
            notify("stream created", || listener.on_stream_created(stream));
        }
    }

    pub(crate) fn stream_closed(&self, stream: &Arc<Stream>) {
        for listener in self.stream_listeners() {
            notify("stream closed", || listener.on_stream_closed(stream));
        }
    }
}
