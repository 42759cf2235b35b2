use std::sync::{Arc, Mutex};

use bytes::Bytes;
use spdy_session::{
    ControlListener, DataInfo, GoAwayInfo, HeadersInfo, PingInfo, ReplyInfo, RstInfo, Session,
    SessionFrameListener, SettingsInfo, Stream, StreamFrameListener, StreamListener, SynInfo,
};

/// Everything a listener can observe.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Event {
    StreamCreated(u32),
    StreamClosed(u32),
    Syn(u32, SynInfo),
    Reply(u32, ReplyInfo),
    Headers(u32, HeadersInfo),
    Data(u32, Bytes, bool),
    Rst(RstInfo),
    Settings(SettingsInfo),
    Ping(u32),
    GoAway(GoAwayInfo),
}

/// Listener for every category that appends to a shared event log.
///
/// As the session listener it hands out itself as the stream listener of
/// every peer-opened stream, unless `refuse_streams` is set.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
    refuse_streams: bool,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A listener that gives peer streams no stream listener.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            refuse_streams: true,
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl StreamListener for RecordingListener {
    fn on_stream_created(&self, stream: &Arc<Stream>) {
        self.push(Event::StreamCreated(stream.id()));
    }

    fn on_stream_closed(&self, stream: &Arc<Stream>) {
        self.push(Event::StreamClosed(stream.id()));
    }
}

impl ControlListener for RecordingListener {
    fn on_rst(&self, _session: &Arc<Session>, info: &RstInfo) {
        self.push(Event::Rst(*info));
    }

    fn on_settings(&self, _session: &Arc<Session>, info: &SettingsInfo) {
        self.push(Event::Settings(info.clone()));
    }

    fn on_ping(&self, _session: &Arc<Session>, info: &PingInfo) {
        self.push(Event::Ping(info.ping_id));
    }

    fn on_go_away(&self, _session: &Arc<Session>, info: &GoAwayInfo) {
        self.push(Event::GoAway(*info));
    }
}

impl SessionFrameListener for RecordingListener {
    fn on_syn(&self, stream: &Arc<Stream>, info: &SynInfo) -> Option<Arc<dyn StreamFrameListener>> {
        self.push(Event::Syn(stream.id(), info.clone()));
        if self.refuse_streams {
            None
        } else {
            Some(Arc::new(self.clone()))
        }
    }
}

impl StreamFrameListener for RecordingListener {
    fn on_reply(&self, stream: &Arc<Stream>, info: &ReplyInfo) {
        self.push(Event::Reply(stream.id(), info.clone()));
    }

    fn on_headers(&self, stream: &Arc<Stream>, info: &HeadersInfo) {
        self.push(Event::Headers(stream.id(), info.clone()));
    }

    fn on_data(&self, stream: &Arc<Stream>, data: &DataInfo) {
        self.push(Event::Data(stream.id(), data.as_bytes().clone(), data.is_close()));
    }
}
