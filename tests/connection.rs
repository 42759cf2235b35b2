//! Transport tests
//!
//! Two sessions talking over an in-memory duplex pipe, plus a session
//! against a raw peer that reads and writes wire bytes directly.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use spdy_session::frame::{ControlFrame, DataFrame, PingFrame};
use spdy_session::transport::Connection;
use spdy_session::{
    ControlListener, DataInfo, GoAwayInfo, Generator, Headers, Parser, ParserListener, PingInfo,
    ReplyInfo, Session, SessionConfig, SessionException, SessionFrameListener, SessionStatus,
    StandardGenerator, Stream, StreamException, StreamFrameListener, SynInfo, Version,
};

mod helpers;
use helpers::init_tracing;
use helpers::recording_listener::Event;

const WAIT: Duration = Duration::from_secs(5);

/// Forwards every notification to a channel the test awaits.
#[derive(Clone)]
struct ChannelListener {
    events: mpsc::UnboundedSender<Event>,
}

impl ChannelListener {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { events }), rx)
    }

    fn send(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

impl ControlListener for ChannelListener {
    fn on_ping(&self, _session: &Arc<Session>, info: &PingInfo) {
        self.send(Event::Ping(info.ping_id));
    }

    fn on_go_away(&self, _session: &Arc<Session>, info: &GoAwayInfo) {
        self.send(Event::GoAway(*info));
    }
}

impl SessionFrameListener for ChannelListener {
    fn on_syn(&self, stream: &Arc<Stream>, info: &SynInfo) -> Option<Arc<dyn StreamFrameListener>> {
        self.send(Event::Syn(stream.id(), info.clone()));
        Some(Arc::new(self.clone()))
    }
}

impl StreamFrameListener for ChannelListener {
    fn on_reply(&self, stream: &Arc<Stream>, info: &ReplyInfo) {
        self.send(Event::Reply(stream.id(), info.clone()));
    }

    fn on_data(&self, stream: &Arc<Stream>, data: &DataInfo) {
        self.send(Event::Data(stream.id(), data.as_bytes().clone(), data.is_close()));
    }
}

/// Server side that answers every stream and echoes its data back.
struct EchoServer;

impl ControlListener for EchoServer {}

impl SessionFrameListener for EchoServer {
    fn on_syn(&self, stream: &Arc<Stream>, _info: &SynInfo) -> Option<Arc<dyn StreamFrameListener>> {
        let headers: Headers = [(":status", "200")].into_iter().collect();
        stream.reply(ReplyInfo::new(headers, false)).unwrap();
        Some(Arc::new(EchoServer))
    }
}

impl StreamFrameListener for EchoServer {
    fn on_data(&self, stream: &Arc<Stream>, data: &DataInfo) {
        stream
            .data(DataInfo::new(data.as_bytes().clone(), data.is_close()))
            .unwrap();
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("listener dropped")
}

#[derive(Default)]
struct Frames {
    control: Vec<ControlFrame>,
    data: Vec<(DataFrame, Bytes)>,
}

impl Frames {
    fn parse(bytes: &[u8]) -> Self {
        let collector = Collector::default();
        Parser::new().parse(bytes, &collector);
        collector.frames.into_inner().unwrap()
    }
}

#[derive(Default)]
struct Collector {
    frames: std::sync::Mutex<Frames>,
}

impl ParserListener for Collector {
    fn on_control_frame(&self, frame: ControlFrame) {
        self.frames.lock().unwrap().control.push(frame);
    }

    fn on_data_frame(&self, frame: DataFrame, data: Bytes) {
        self.frames.lock().unwrap().data.push((frame, data));
    }

    fn on_stream_exception(&self, error: StreamException) {
        panic!("unexpected stream exception: {}", error);
    }

    fn on_session_exception(&self, error: SessionException) {
        panic!("unexpected session exception: {}", error);
    }
}

#[tokio::test]
async fn test_request_and_echo_round_trip() {
    init_tracing();
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let server = Connection::start(server_io, SessionConfig::server(), Some(Arc::new(EchoServer)))
        .unwrap();
    let client = Connection::start(client_io, SessionConfig::client(), None).unwrap();

    let (listener, mut rx) = ChannelListener::new();
    let headers: Headers = [(":method", "POST"), (":path", "/echo")].into_iter().collect();
    let stream = client
        .session()
        .syn(Version::V3, SynInfo::new(headers, false), Some(listener))
        .unwrap();
    stream.data(DataInfo::new(&b"hello"[..], true)).unwrap();

    match next(&mut rx).await {
        Event::Reply(1, info) => assert_eq!(info.headers.get(":status"), Some("200")),
        other => panic!("expected reply, got {:?}", other),
    }
    assert_eq!(
        next(&mut rx).await,
        Event::Data(1, Bytes::from_static(b"hello"), true)
    );
    assert!(stream.is_remote_closed());
    assert_eq!(server.session().config().initial_stream_id, 2);
}

#[tokio::test]
async fn test_ping_is_echoed_by_peer() {
    init_tracing();
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let _server = Connection::start(server_io, SessionConfig::server(), None).unwrap();
    let (listener, mut rx) = ChannelListener::new();
    let client = Connection::start(client_io, SessionConfig::client(), Some(listener)).unwrap();

    let ping = client.session().ping(Version::V3);
    assert_eq!(next(&mut rx).await, Event::Ping(ping.ping_id));

    let ping = client.session().ping(Version::V2);
    assert_eq!(next(&mut rx).await, Event::Ping(ping.ping_id));
    assert_eq!(ping.ping_id, 3);
}

#[tokio::test]
async fn test_go_away_closes_both_ends() {
    init_tracing();
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (listener, mut rx) = ChannelListener::new();
    let server = Connection::start(server_io, SessionConfig::server(), Some(listener)).unwrap();
    let client = Connection::start(client_io, SessionConfig::client(), None).unwrap();

    client.session().go_away(Version::V3);

    assert_eq!(
        next(&mut rx).await,
        Event::GoAway(GoAwayInfo {
            last_stream_id: 0,
            status: SessionStatus::Ok,
        })
    );
    assert!(server.session().is_go_away_received());

    tokio::time::timeout(WAIT, client.closed())
        .await
        .expect("client did not close")
        .unwrap();
    tokio::time::timeout(WAIT, server.closed())
        .await
        .expect("server did not close")
        .unwrap();
}

#[tokio::test]
async fn test_peer_eof_closes_connection() {
    init_tracing();
    let (client_io, peer) = tokio::io::duplex(1024);
    let client = Connection::start(client_io, SessionConfig::client(), None).unwrap();

    drop(peer);

    tokio::time::timeout(WAIT, client.closed())
        .await
        .expect("connection did not close")
        .unwrap();
}

#[tokio::test]
async fn test_frames_on_the_wire() {
    init_tracing();
    let (client_io, mut peer) = tokio::io::duplex(64 * 1024);
    let client = Connection::start(client_io, SessionConfig::client(), None).unwrap();

    let headers: Headers = [(":path", "/")].into_iter().collect();
    client
        .session()
        .syn(Version::V2, SynInfo::new(headers, true), None)
        .unwrap();

    // peer pings with an even id, which the client must echo
    let ping = StandardGenerator::new()
        .control(&ControlFrame::Ping(PingFrame {
            version: Version::V3,
            ping_id: 2,
        }))
        .unwrap();
    peer.write_all(&ping).await.unwrap();

    let mut received = BytesMut::new();
    let frames = tokio::time::timeout(WAIT, async {
        loop {
            let mut buf = [0u8; 1024];
            let n = peer.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early");
            received.extend_from_slice(&buf[..n]);
            let frames = Frames::parse(&received);
            if frames.control.len() == 2 {
                return frames;
            }
        }
    })
    .await
    .expect("frames not received");

    match &frames.control[0] {
        ControlFrame::SynStream(syn) => {
            assert_eq!(syn.version, Version::V2);
            assert_eq!(syn.stream_id, 1);
            assert!(syn.is_close());
        }
        other => panic!("expected SYN_STREAM, got {:?}", other),
    }
    assert_eq!(
        frames.control[1],
        ControlFrame::Ping(PingFrame {
            version: Version::V3,
            ping_id: 2,
        })
    );
    assert!(frames.data.is_empty());
}
