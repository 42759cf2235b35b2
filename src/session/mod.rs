//! Session and stream multiplexing.
//!
//! A [`Session`] owns every stream of one connection. Application threads
//! call its operations (`syn`, `rst`, `settings`, `ping`, `go_away`, `data`),
//! while the transport feeds parsed frames through the [`ParserListener`]
//! implementation. Outbound frames pass through a single queue that writes
//! one frame at a time through the [`Controller`].
//!
//! ## Locking
//!
//! - The stream table lock also guards stream id allocation, so streams hit
//!   the wire in id order.
//! - The queue lock is only taken inside the table lock to enqueue.
//! - Listeners are never called while either lock is held.

mod controller;
mod info;
mod listener;
mod queue;
mod stream;

pub use controller::{Controller, WriteHandler};
pub use info::{
    DataInfo, GoAwayInfo, HeadersInfo, PingInfo, ReplyInfo, RstInfo, SettingsInfo, SynInfo,
};
pub use listener::{ControlListener, SessionFrameListener, StreamFrameListener, StreamListener};
pub use stream::Stream;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::codec::{Generator, ParserListener};
use crate::config::SessionConfig;
use crate::error::{Error, Result, SessionException, StreamException};
use crate::frame::{
    flags, ControlFrame, ControlFrameType, DataFrame, GoAwayFrame, HeadersFrame, PingFrame,
    RstStreamFrame, SessionStatus, SettingId, SettingsFrame, StreamStatus, SynReplyFrame,
    SynStreamFrame, WindowUpdateFrame, DATA_HEADER_LENGTH,
};
use crate::version::Version;
use listener::{notify, Listeners};
use queue::{DataUnit, FrameUnit, OutboundQueue};

/// One multiplexed connection.
pub struct Session {
    this: Weak<Session>,
    config: SessionConfig,
    controller: Arc<dyn Controller>,
    generator: Arc<dyn Generator>,
    listener: Option<Arc<dyn SessionFrameListener>>,
    streams: Mutex<HashMap<u32, Arc<Stream>>>,
    stream_ids: AtomicU32,
    ping_ids: AtomicU32,
    initial_window_size: AtomicI32,
    last_stream_id: AtomicU32,
    go_away_sent: AtomicBool,
    go_away_received: AtomicBool,
    queue: OutboundQueue,
    listeners: Listeners,
}

impl Session {
    /// Create a session over `controller`.
    ///
    /// `listener` is asked how to handle streams the peer opens and receives
    /// control notifications; without one, peer streams get no listener.
    pub fn new(
        config: SessionConfig,
        controller: Arc<dyn Controller>,
        generator: Arc<dyn Generator>,
        listener: Option<Arc<dyn SessionFrameListener>>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new_cyclic(|this| Self {
            this: this.clone(),
            stream_ids: AtomicU32::new(config.initial_stream_id),
            ping_ids: AtomicU32::new(config.initial_stream_id),
            initial_window_size: AtomicI32::new(config.initial_window_size),
            config,
            controller,
            generator,
            listener,
            streams: Mutex::new(HashMap::new()),
            last_stream_id: AtomicU32::new(0),
            go_away_sent: AtomicBool::new(false),
            go_away_received: AtomicBool::new(false),
            queue: OutboundQueue::default(),
            listeners: Listeners::default(),
        }))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a new stream.
    ///
    /// The stream id is consumed even when the SYN_STREAM cannot be
    /// generated.
    pub fn syn(
        &self,
        version: Version,
        info: SynInfo,
        listener: Option<Arc<dyn StreamFrameListener>>,
    ) -> Result<Arc<Stream>> {
        if info.unidirectional {
            return Err(Error::Unsupported("unidirectional streams".to_string()));
        }
        if self.go_away_sent.load(Ordering::Acquire) {
            return Err(Error::SessionClosed);
        }

        let stream = {
            let mut streams = self.streams.lock();
            let stream_id = self.stream_ids.fetch_add(2, Ordering::AcqRel);
            let stream = Arc::new(Stream::new(
                stream_id,
                version,
                info.priority,
                self.initial_window_size.load(Ordering::Acquire),
                self.this.clone(),
                listener,
            ));
            streams.insert(stream_id, stream.clone());

            let frame = ControlFrame::SynStream(SynStreamFrame {
                version,
                flags: info.flags(),
                stream_id,
                associated_stream_id: info.associated_stream_id,
                priority: info.priority,
                headers: info.headers,
            });
            let bytes = match self.generator.control(&frame) {
                Ok(bytes) => bytes,
                Err(e) => {
                    streams.remove(&stream_id);
                    return Err(Error::StreamCreation(format!("stream {}: {}", stream_id, e)));
                }
            };
            if info.close {
                stream.close_local();
            }
            self.queue.enqueue(FrameUnit::Control {
                frame_type: ControlFrameType::SynStream,
                bytes,
                stream: Some(stream.clone()),
            });
            stream
        };

        tracing::debug!("Created {:?}", stream);
        self.listeners.stream_created(&stream);
        self.flush();
        Ok(stream)
    }

    /// Reset a stream.
    ///
    /// Does nothing once GOAWAY was sent. A status that cannot be expressed
    /// in `version` is logged and dropped.
    pub fn rst(&self, version: Version, info: RstInfo) {
        if self.go_away_sent.load(Ordering::Acquire) {
            tracing::debug!("Skipping reset of stream {} after GOAWAY", info.stream_id);
            return;
        }

        match self.generate_rst(version, &info) {
            Ok(bytes) => self.queue.enqueue(FrameUnit::Control {
                frame_type: ControlFrameType::RstStream,
                bytes,
                stream: None,
            }),
            Err(e) => tracing::info!("Could not reset stream {}: {}", info.stream_id, e),
        }

        if let Some(stream) = self.find_stream(info.stream_id) {
            stream.mark_reset();
            self.remove_stream(&stream);
        }
        self.flush();
    }

    fn generate_rst(&self, version: Version, info: &RstInfo) -> Result<Bytes> {
        let status_code = info.status.code(version).ok_or_else(|| {
            Error::generation(format!("{:?} does not exist in {}", info.status, version))
        })?;
        self.generator.control(&ControlFrame::RstStream(RstStreamFrame {
            version,
            stream_id: info.stream_id,
            status_code,
        }))
    }

    /// Send SETTINGS.
    ///
    /// # Panics
    ///
    /// If the frame cannot be generated.
    pub fn settings(&self, version: Version, info: SettingsInfo) {
        let frame = ControlFrame::Settings(SettingsFrame {
            version,
            flags: info.flags(),
            settings: info.settings,
        });
        self.send_control(frame);
    }

    /// Send a PING and return its id.
    ///
    /// # Panics
    ///
    /// If the frame cannot be generated.
    pub fn ping(&self, version: Version) -> PingInfo {
        let ping_id = self.ping_ids.fetch_add(2, Ordering::AcqRel);
        self.send_control(ControlFrame::Ping(PingFrame { version, ping_id }));
        PingInfo { ping_id }
    }

    /// Announce that no new streams will be accepted. Only the first call
    /// has an effect; nothing is sent if the peer already sent GOAWAY.
    ///
    /// # Panics
    ///
    /// If the frame cannot be generated.
    pub fn go_away(&self, version: Version) {
        if let Err(e) = self.send_go_away(version, SessionStatus::Ok) {
            panic!("Cannot generate GOAWAY: {}", e);
        }
    }

    fn send_go_away(&self, version: Version, status: SessionStatus) -> Result<()> {
        if self
            .go_away_sent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        if self.go_away_received.load(Ordering::Acquire) {
            return Ok(());
        }

        let frame = ControlFrame::GoAway(GoAwayFrame {
            version,
            last_stream_id: self.last_stream_id.load(Ordering::Acquire),
            status_code: status.code(),
        });
        let bytes = self.generator.control(&frame)?;
        tracing::debug!("Sending {:?}", frame);
        self.queue.enqueue(FrameUnit::Control {
            frame_type: ControlFrameType::GoAway,
            bytes,
            stream: None,
        });
        self.flush();
        Ok(())
    }

    /// Generate, enqueue and flush a session-level control frame that must
    /// not fail.
    fn send_control(&self, frame: ControlFrame) {
        let frame_type = frame.frame_type();
        let bytes = match self.generator.control(&frame) {
            Ok(bytes) => bytes,
            Err(e) => panic!("Cannot generate {:?}: {}", frame_type, e),
        };
        self.queue.enqueue(FrameUnit::Control {
            frame_type,
            bytes,
            stream: None,
        });
        self.flush();
    }

    /// Generate and send a control frame on behalf of `stream`.
    ///
    /// A frame carrying FIN half-closes the stream's local side.
    pub(crate) fn control(&self, stream: Option<&Arc<Stream>>, frame: ControlFrame) -> Result<()> {
        let bytes = self.generator.control(&frame)?;
        tracing::debug!("Posting {:?}", frame);
        if let Some(stream) = stream {
            if closes_stream(&frame) {
                stream.close_local();
            }
        }
        self.queue.enqueue(FrameUnit::Control {
            frame_type: frame.frame_type(),
            bytes,
            stream: stream.cloned(),
        });
        self.flush();
        Ok(())
    }

    /// Queue `info` on `stream`.
    pub fn data(&self, stream: &Arc<Stream>, info: DataInfo) -> Result<()> {
        if stream.is_local_closed() {
            return Err(Error::StreamClosed(stream.id()));
        }
        tracing::debug!("Posting {} bytes on {:?}", info.available(), stream);
        self.queue.enqueue(FrameUnit::Data(DataUnit {
            stream: stream.clone(),
            data: info,
            written: 0,
        }));
        self.flush();
        Ok(())
    }

    /// Snapshot of the open streams, ordered by id.
    pub fn streams(&self) -> Vec<Arc<Stream>> {
        let mut streams: Vec<_> = self.streams.lock().values().cloned().collect();
        streams.sort_by_key(|s| s.id());
        streams
    }

    pub fn stream(&self, stream_id: u32) -> Option<Arc<Stream>> {
        self.find_stream(stream_id)
    }

    /// Highest peer-initiated stream id fully processed, as carried by GOAWAY.
    pub fn last_stream_id(&self) -> u32 {
        self.last_stream_id.load(Ordering::Acquire)
    }

    pub fn is_go_away_sent(&self) -> bool {
        self.go_away_sent.load(Ordering::Acquire)
    }

    pub fn is_go_away_received(&self) -> bool {
        self.go_away_received.load(Ordering::Acquire)
    }

    /// Frames waiting to be written.
    pub fn queued_frames(&self) -> usize {
        self.queue.len()
    }

    pub fn add_stream_listener(&self, listener: Arc<dyn StreamListener>) {
        self.listeners.add_stream(listener);
    }

    pub fn remove_stream_listener(&self, listener: &Arc<dyn StreamListener>) -> bool {
        self.listeners.remove_stream(listener)
    }

    pub fn add_control_listener(&self, listener: Arc<dyn ControlListener>) {
        self.listeners.add_control(listener);
    }

    pub fn remove_control_listener(&self, listener: &Arc<dyn ControlListener>) -> bool {
        self.listeners.remove_control(listener)
    }

    fn find_stream(&self, stream_id: u32) -> Option<Arc<Stream>> {
        self.streams.lock().get(&stream_id).cloned()
    }

    /// Remove `stream` from the table. Removing twice is a no-op.
    fn remove_stream(&self, stream: &Arc<Stream>) {
        let removed = self.streams.lock().remove(&stream.id()).is_some();
        if !removed {
            return;
        }
        self.update_last_stream_id(stream);
        tracing::debug!("Removed {:?}", stream);
        self.listeners.stream_closed(stream);
    }

    fn update_last_stream_id(&self, stream: &Stream) {
        if stream.is_closed() && !self.config.is_local_stream(stream.id()) {
            self.last_stream_id.fetch_max(stream.id(), Ordering::AcqRel);
        }
    }

    /// Write queued frames, one at a time.
    ///
    /// Loops while the controller completes writes inside `write`, so a
    /// synchronous controller drains the queue without recursion.
    pub(crate) fn flush(&self) {
        loop {
            let Some(unit) = self.queue.poll() else {
                return;
            };
            let mut data = match unit {
                FrameUnit::Control {
                    frame_type,
                    bytes,
                    stream,
                } => {
                    let unit = FrameUnit::Control {
                        frame_type,
                        bytes: bytes.clone(),
                        stream,
                    };
                    if self.write(bytes, unit) {
                        continue;
                    }
                    return;
                }
                FrameUnit::Data(data) => data,
            };

            let stream = data.stream.clone();
            if stream.is_reset() {
                tracing::debug!("Dropping data for reset {:?}", stream);
                self.queue.finish();
                continue;
            }
            // the window may have shrunk since the unit was polled
            let window = stream.window_size();
            if window <= 0 {
                self.queue.requeue(FrameUnit::Data(data));
                self.queue.finish();
                continue;
            }
            match self.generator.data(stream.id(), window, &mut data.data) {
                Ok(bytes) => {
                    data.written = bytes.len() - DATA_HEADER_LENGTH;
                    if self.write(bytes, FrameUnit::Data(data)) {
                        continue;
                    }
                    return;
                }
                Err(e) => {
                    tracing::info!("Could not generate data for {:?}: {}", stream, e);
                    self.queue.finish();
                    self.rst(
                        stream.version(),
                        RstInfo::new(stream.id(), StreamStatus::InternalError),
                    );
                    return;
                }
            }
        }
    }

    /// Hand one frame to the controller. Returns true if the write already
    /// completed and flushing should go on.
    fn write(&self, bytes: Bytes, unit: FrameUnit) -> bool {
        let Some(session) = self.this.upgrade() else {
            self.queue.finish();
            return false;
        };
        tracing::debug!("Writing {} frame bytes of {:?}", bytes.len(), unit);
        let seq = self.queue.begin_write();
        self.controller.write(bytes, WriteHandler::new(session, unit));
        self.queue.end_write(seq)
    }

    fn write_completed(&self, unit: FrameUnit) {
        match unit {
            FrameUnit::Control {
                frame_type, stream, ..
            } => {
                if frame_type == ControlFrameType::GoAway {
                    // peers learn the last good stream id from the frame itself
                    self.controller.close(false);
                }
                if let Some(stream) = stream {
                    if stream.is_closed() {
                        self.remove_stream(&stream);
                    }
                }
            }
            FrameUnit::Data(data) => {
                let stream = data.stream.clone();
                let written = i32::try_from(data.written).unwrap_or(i32::MAX);
                if let Err(e) = stream.update_window(-written) {
                    self.window_overflow(&stream, e);
                } else if !data.data.is_consumed() {
                    self.queue.requeue(FrameUnit::Data(data));
                } else {
                    if data.data.is_close() {
                        stream.close_local();
                    }
                    if stream.is_closed() {
                        self.remove_stream(&stream);
                    }
                }
            }
        }
        if self.queue.complete() {
            self.flush();
        }
    }

    fn write_failed(&self, unit: FrameUnit, error: io::Error) {
        tracing::warn!("Write of {:?} failed: {}", unit, error);
        self.queue.clear();
        self.controller.close(false);
    }

    /// Reset a stream whose window left the representable range.
    fn window_overflow(&self, stream: &Arc<Stream>, error: Error) {
        tracing::info!("Flow control error on {:?}: {}", stream, error);
        self.rst(
            stream.version(),
            RstInfo::new(stream.id(), StreamStatus::FlowControlError),
        );
    }

    fn session_arc(&self) -> Option<Arc<Session>> {
        self.this.upgrade()
    }

    fn on_syn(&self, frame: SynStreamFrame) {
        let stream_id = frame.stream_id;
        if stream_id == 0 || self.config.is_local_stream(stream_id) {
            tracing::debug!("Rejecting SYN_STREAM with invalid id {}", stream_id);
            self.rst(frame.version, RstInfo::new(stream_id, StreamStatus::ProtocolError));
            return;
        }

        // the window is read under the table lock so SETTINGS cannot apply
        // its delta on top of an already updated initial size
        let created = {
            let mut streams = self.streams.lock();
            match streams.get(&stream_id) {
                Some(existing) => Err(existing.version()),
                None => {
                    let stream = Arc::new(Stream::new(
                        stream_id,
                        frame.version,
                        frame.priority,
                        self.initial_window_size.load(Ordering::Acquire),
                        self.this.clone(),
                        None,
                    ));
                    streams.insert(stream_id, stream.clone());
                    Ok(stream)
                }
            }
        };
        let stream = match created {
            Ok(stream) => stream,
            Err(version) => {
                tracing::debug!("Duplicate SYN_STREAM for stream {}", stream_id);
                self.rst(version, RstInfo::new(stream_id, StreamStatus::ProtocolError));
                return;
            }
        };

        if frame.is_close() {
            stream.close_remote();
        }
        if frame.is_unidirectional() {
            stream.close_local();
        }
        tracing::debug!("Opened remote {:?}", stream);
        self.listeners.stream_created(&stream);

        let info = SynInfo {
            headers: frame.headers,
            close: (frame.flags & flags::FIN) != 0,
            unidirectional: (frame.flags & flags::UNIDIRECTIONAL) != 0,
            associated_stream_id: frame.associated_stream_id,
            priority: frame.priority,
        };
        if let Some(listener) = &self.listener {
            let stream_listener = notify("syn", || listener.on_syn(&stream, &info)).flatten();
            stream.set_listener(stream_listener);
        }

        self.flush();
        if stream.is_closed() {
            self.remove_stream(&stream);
        }
    }

    fn on_reply(&self, frame: SynReplyFrame) {
        let Some(stream) = self.find_stream(frame.stream_id) else {
            self.rst(frame.version, RstInfo::new(frame.stream_id, StreamStatus::ProtocolError));
            return;
        };
        let close = frame.is_close();
        stream.process_reply(ReplyInfo::new(frame.headers, close));
        self.flush();
        if stream.is_closed() {
            self.remove_stream(&stream);
        }
    }

    fn on_headers(&self, frame: HeadersFrame) {
        let Some(stream) = self.find_stream(frame.stream_id) else {
            self.rst(frame.version, RstInfo::new(frame.stream_id, StreamStatus::ProtocolError));
            return;
        };
        let close = frame.is_close();
        stream.process_headers(HeadersInfo::new(frame.headers, close));
        self.flush();
        if stream.is_closed() {
            self.remove_stream(&stream);
        }
    }

    fn on_rst(&self, frame: RstStreamFrame) {
        let status = StreamStatus::from_code(frame.version, frame.status_code)
            .unwrap_or(StreamStatus::ProtocolError);
        let info = RstInfo::new(frame.stream_id, status);
        if let Some(session) = self.session_arc() {
            if let Some(listener) = &self.listener {
                notify("rst", || listener.on_rst(&session, &info));
            }
            for listener in self.listeners.control_listeners() {
                notify("rst", || listener.on_rst(&session, &info));
            }
        }
        if let Some(stream) = self.find_stream(frame.stream_id) {
            stream.mark_reset();
            self.remove_stream(&stream);
        }
    }

    fn on_settings(&self, frame: SettingsFrame) {
        if let Some(size) = frame.get(SettingId::InitialWindowSize) {
            let size = i32::try_from(size).unwrap_or(i32::MAX);
            let mut overflowed = Vec::new();
            {
                // streams created concurrently must see either the old size
                // plus the delta or the new size, never both
                let streams = self.streams.lock();
                let previous = self.initial_window_size.swap(size, Ordering::AcqRel);
                // both sizes are non-negative, so the difference fits
                let delta = size - previous;
                if delta != 0 {
                    for stream in streams.values() {
                        if let Err(e) = stream.update_window(delta) {
                            overflowed.push((stream.clone(), e));
                        }
                    }
                }
            }
            for (stream, error) in overflowed {
                self.window_overflow(&stream, error);
            }
        }

        let info = SettingsInfo {
            clear_persisted: frame.is_clear_persisted(),
            settings: frame.settings,
        };
        if let Some(session) = self.session_arc() {
            if let Some(listener) = &self.listener {
                notify("settings", || listener.on_settings(&session, &info));
            }
            for listener in self.listeners.control_listeners() {
                notify("settings", || listener.on_settings(&session, &info));
            }
        }
        self.flush();
    }

    fn on_ping(&self, frame: PingFrame) {
        let local_parity = self.ping_ids.load(Ordering::Acquire) % 2;
        if frame.ping_id % 2 == local_parity {
            let info = PingInfo {
                ping_id: frame.ping_id,
            };
            if let Some(session) = self.session_arc() {
                if let Some(listener) = &self.listener {
                    notify("ping", || listener.on_ping(&session, &info));
                }
                for listener in self.listeners.control_listeners() {
                    notify("ping", || listener.on_ping(&session, &info));
                }
            }
        } else {
            let echo = ControlFrame::Ping(frame);
            match self.generator.control(&echo) {
                Ok(bytes) => self.queue.enqueue(FrameUnit::Control {
                    frame_type: ControlFrameType::Ping,
                    bytes,
                    stream: None,
                }),
                Err(e) => tracing::info!("Could not echo {:?}: {}", echo, e),
            }
        }
        self.flush();
    }

    fn on_go_away(&self, frame: GoAwayFrame) {
        if self
            .go_away_received
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let info = GoAwayInfo {
            last_stream_id: frame.last_stream_id,
            status: SessionStatus::from_code(frame.status_code)
                .unwrap_or(SessionStatus::ProtocolError),
        };
        if let Some(session) = self.session_arc() {
            if let Some(listener) = &self.listener {
                notify("go away", || listener.on_go_away(&session, &info));
            }
            for listener in self.listeners.control_listeners() {
                notify("go away", || listener.on_go_away(&session, &info));
            }
        }
        self.flush();
        self.controller.close(true);
    }

    fn on_window_update(&self, frame: WindowUpdateFrame) {
        if let Some(stream) = self.find_stream(frame.stream_id) {
            let delta = i32::try_from(frame.delta).unwrap_or(i32::MAX);
            if let Err(e) = stream.update_window(delta) {
                self.window_overflow(&stream, e);
                return;
            }
        }
        self.flush();
    }
}

/// Whether a stream-scoped control frame carries FIN.
fn closes_stream(frame: &ControlFrame) -> bool {
    match frame {
        ControlFrame::SynStream(f) => f.is_close(),
        ControlFrame::SynReply(f) => f.is_close(),
        ControlFrame::Headers(f) => f.is_close(),
        _ => false,
    }
}

impl ParserListener for Session {
    fn on_control_frame(&self, frame: ControlFrame) {
        if self.go_away_sent.load(Ordering::Acquire) {
            tracing::debug!("Skipped processing of {:?}", frame.frame_type());
            return;
        }
        tracing::debug!("Processing {:?}", frame.frame_type());
        match frame {
            ControlFrame::SynStream(f) => self.on_syn(f),
            ControlFrame::SynReply(f) => self.on_reply(f),
            ControlFrame::RstStream(f) => self.on_rst(f),
            ControlFrame::Settings(f) => self.on_settings(f),
            ControlFrame::Noop(_) => {}
            ControlFrame::Ping(f) => self.on_ping(f),
            ControlFrame::GoAway(f) => self.on_go_away(f),
            ControlFrame::Headers(f) => self.on_headers(f),
            ControlFrame::WindowUpdate(f) => self.on_window_update(f),
        }
    }

    fn on_data_frame(&self, frame: DataFrame, data: Bytes) {
        if self.go_away_sent.load(Ordering::Acquire) {
            tracing::debug!("Skipped processing of data on stream {}", frame.stream_id);
            return;
        }
        let Some(stream) = self.find_stream(frame.stream_id) else {
            tracing::debug!("Data for unknown stream {}", frame.stream_id);
            self.rst(Version::lowest(), RstInfo::new(frame.stream_id, StreamStatus::InvalidStream));
            return;
        };
        stream.process_data(DataInfo::new(data, frame.is_close()));
        self.flush();
        if stream.is_closed() {
            self.remove_stream(&stream);
        }
    }

    fn on_stream_exception(&self, error: StreamException) {
        tracing::info!("Stream exception: {}", error);
        let version = self
            .find_stream(error.stream_id)
            .map(|s| s.version())
            .unwrap_or(self.config.version);
        self.rst(version, RstInfo::new(error.stream_id, error.status));
    }

    fn on_session_exception(&self, error: SessionException) {
        tracing::warn!("Session exception: {}", error);
        if self.go_away_sent.load(Ordering::Acquire) || self.go_away_received.load(Ordering::Acquire) {
            self.controller.close(false);
            return;
        }
        if let Err(e) = self.send_go_away(self.config.version, error.status) {
            tracing::info!("Could not send GOAWAY: {}", e);
            self.controller.close(false);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("initial_stream_id", &self.config.initial_stream_id)
            .field("streams", &self.streams.lock().len())
            .field("queued", &self.queue.len())
            .field("flushing", &self.queue.is_flushing())
            .field("go_away_sent", &self.is_go_away_sent())
            .field("go_away_received", &self.is_go_away_received())
            .finish()
    }
}
