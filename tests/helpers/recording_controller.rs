use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use bytes::{Bytes, BytesMut};
use spdy_session::frame::{ControlFrame, DataFrame};
use spdy_session::{
    Controller, Parser, ParserListener, SessionException, StreamException, WriteHandler,
};

/// A frame decoded from the controller's output.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Frame {
    Control(ControlFrame),
    Data(DataFrame, Bytes),
}

#[allow(dead_code)]
impl Frame {
    pub fn control(&self) -> Option<&ControlFrame> {
        match self {
            Frame::Control(frame) => Some(frame),
            Frame::Data(..) => None,
        }
    }

    pub fn data(&self) -> Option<(&DataFrame, &Bytes)> {
        match self {
            Frame::Control(_) => None,
            Frame::Data(frame, payload) => Some((frame, payload)),
        }
    }
}

/// Controller that records writes and closes.
///
/// In immediate mode each write completes before `write` returns. In
/// deferred mode handlers are held until the test completes them.
#[allow(dead_code)]
pub struct RecordingController {
    deferred: bool,
    fail_writes: AtomicBool,
    writes: Mutex<Vec<Bytes>>,
    pending: Mutex<VecDeque<WriteHandler>>,
    closes: Mutex<Vec<bool>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingController {
    pub fn immediate() -> Self {
        Self::new(false)
    }

    pub fn deferred() -> Self {
        Self::new(true)
    }

    fn new(deferred: bool) -> Self {
        Self {
            deferred,
            fail_writes: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            closes: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail every following write.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Complete the oldest deferred write. Returns false if none is pending.
    pub fn complete_next(&self) -> bool {
        let handler = self.pending.lock().unwrap().pop_front();
        match handler {
            Some(handler) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                handler.complete();
                true
            }
            None => false,
        }
    }

    /// Complete deferred writes until none is left.
    pub fn complete_all(&self) -> usize {
        let mut completed = 0;
        while self.complete_next() {
            completed += 1;
        }
        completed
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> Vec<bool> {
        self.closes.lock().unwrap().clone()
    }

    /// Every frame written so far, in write order.
    pub fn frames(&self) -> Vec<Frame> {
        let mut all = BytesMut::new();
        for bytes in self.writes.lock().unwrap().iter() {
            all.extend_from_slice(bytes);
        }
        let collector = Collector::default();
        Parser::new().parse(&all, &collector);
        assert!(
            collector.errors.lock().unwrap().is_empty(),
            "written bytes do not parse: {:?}",
            collector.errors.lock().unwrap()
        );
        collector.frames.into_inner().unwrap()
    }

    pub fn control_frames(&self) -> Vec<ControlFrame> {
        self.frames()
            .into_iter()
            .filter_map(|f| f.control().cloned())
            .collect()
    }

    pub fn data_frames(&self) -> Vec<(DataFrame, Bytes)> {
        self.frames()
            .into_iter()
            .filter_map(|f| f.data().map(|(h, p)| (*h, p.clone())))
            .collect()
    }
}

impl Controller for RecordingController {
    fn write(&self, bytes: Bytes, handler: WriteHandler) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            handler.failed(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
            return;
        }

        self.writes.lock().unwrap().push(bytes);
        if self.deferred {
            self.pending.lock().unwrap().push_back(handler);
        } else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            handler.complete();
        }
    }

    fn close(&self, graceful: bool) {
        self.closes.lock().unwrap().push(graceful);
    }
}

#[derive(Default)]
struct Collector {
    frames: Mutex<Vec<Frame>>,
    errors: Mutex<Vec<String>>,
}

impl ParserListener for Collector {
    fn on_control_frame(&self, frame: ControlFrame) {
        self.frames.lock().unwrap().push(Frame::Control(frame));
    }

    fn on_data_frame(&self, frame: DataFrame, data: Bytes) {
        self.frames.lock().unwrap().push(Frame::Data(frame, data));
    }

    fn on_stream_exception(&self, error: StreamException) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn on_session_exception(&self, error: SessionException) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
