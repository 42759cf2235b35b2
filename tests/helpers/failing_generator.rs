use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use spdy_session::frame::{ControlFrame, ControlFrameType};
use spdy_session::{DataInfo, Error, Generator, Result, StandardGenerator};

/// Generator that fails on request and otherwise defers to the standard one.
#[derive(Default)]
#[allow(dead_code)]
pub struct FailingGenerator {
    inner: StandardGenerator,
    failing: Mutex<Vec<ControlFrameType>>,
    fail_data: AtomicBool,
}

#[allow(dead_code)]
impl FailingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following frame of `frame_type`.
    pub fn fail_on(&self, frame_type: ControlFrameType) {
        self.failing.lock().unwrap().push(frame_type);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
        self.fail_data.store(false, Ordering::SeqCst);
    }

    pub fn fail_data(&self) {
        self.fail_data.store(true, Ordering::SeqCst);
    }
}

impl Generator for FailingGenerator {
    fn control(&self, frame: &ControlFrame) -> Result<Bytes> {
        if self.failing.lock().unwrap().contains(&frame.frame_type()) {
            return Err(Error::generation(format!("refusing {:?}", frame.frame_type())));
        }
        self.inner.control(frame)
    }

    fn data(&self, stream_id: u32, window: i32, data: &mut DataInfo) -> Result<Bytes> {
        if self.fail_data.load(Ordering::SeqCst) {
            return Err(Error::generation("refusing data"));
        }
        self.inner.data(stream_id, window, data)
    }
}
