//! Outbound frame queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use super::info::DataInfo;
use super::stream::Stream;
use crate::frame::ControlFrameType;

/// Pending data for one stream, written in window-sized chunks.
pub(crate) struct DataUnit {
    pub(crate) stream: Arc<Stream>,
    pub(crate) data: DataInfo,
    /// Payload bytes of the frame currently being written.
    pub(crate) written: usize,
}

/// One entry of the outbound queue.
pub(crate) enum FrameUnit {
    /// Pre-generated control frame. `stream` is set for frames that can
    /// close a stream (SYN_STREAM, SYN_REPLY, HEADERS).
    Control {
        frame_type: ControlFrameType,
        bytes: Bytes,
        stream: Option<Arc<Stream>>,
    },
    /// Data generated lazily against the stream's window at flush time.
    Data(DataUnit),
}

impl FrameUnit {
    /// Whether the flusher can write this unit right now.
    fn is_ready(&self) -> bool {
        match self {
            FrameUnit::Control { .. } => true,
            // reset streams are ready so the flusher can drop their data
            FrameUnit::Data(unit) => unit.stream.is_reset() || unit.stream.window_size() > 0,
        }
    }

    fn data_stream_id(&self) -> Option<u32> {
        match self {
            FrameUnit::Control { .. } => None,
            FrameUnit::Data(unit) => Some(unit.stream.id()),
        }
    }
}

impl fmt::Debug for FrameUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameUnit::Control {
                frame_type, bytes, ..
            } => write!(f, "{:?} ({} bytes)", frame_type, bytes.len()),
            FrameUnit::Data(unit) => write!(
                f,
                "data on stream {} ({} bytes left)",
                unit.stream.id(),
                unit.data.available()
            ),
        }
    }
}

#[derive(Default)]
struct QueueState {
    units: VecDeque<FrameUnit>,
    flushing: bool,
    /// Sequence number of the last write handed to the controller.
    writes: u64,
    /// Write whose `Controller::write` call has not returned yet.
    in_write: Option<u64>,
    /// `in_write` completed before its controller call returned.
    completed_in_write: bool,
}

/// FIFO of frame units plus the single-flusher flag.
///
/// `flushing` is true exactly while one unit is handed to the controller.
/// Window-blocked data units keep their position; the flusher takes the
/// first ready unit, so data of one stream always leaves in order.
#[derive(Default)]
pub(crate) struct OutboundQueue {
    state: Mutex<QueueState>,
}

impl OutboundQueue {
    pub(crate) fn enqueue(&self, unit: FrameUnit) {
        self.state.lock().units.push_back(unit);
    }

    /// Put back a data unit that still has payload, ahead of any later data
    /// of the same stream.
    pub(crate) fn requeue(&self, unit: FrameUnit) {
        let mut state = self.state.lock();
        let position = unit.data_stream_id().and_then(|id| {
            state
                .units
                .iter()
                .position(|u| u.data_stream_id() == Some(id))
        });
        match position {
            Some(index) => state.units.insert(index, unit),
            None => state.units.push_back(unit),
        }
    }

    /// Take the first ready unit and mark a flush in progress.
    ///
    /// Returns `None` while another flush is in progress or when nothing is
    /// ready.
    pub(crate) fn poll(&self) -> Option<FrameUnit> {
        let mut state = self.state.lock();
        if state.flushing {
            return None;
        }
        let index = state.units.iter().position(FrameUnit::is_ready)?;
        let unit = state.units.remove(index)?;
        state.flushing = true;
        tracing::debug!("Flushing {:?}, {} frame(s) in queue", unit, state.units.len());
        Some(unit)
    }

    /// Release the flush flag.
    pub(crate) fn finish(&self) {
        self.state.lock().flushing = false;
    }

    /// Mark the start of a controller write and return its sequence number.
    pub(crate) fn begin_write(&self) -> u64 {
        let mut state = self.state.lock();
        state.writes += 1;
        state.in_write = Some(state.writes);
        state.completed_in_write = false;
        state.writes
    }

    /// Mark the end of the controller call for write `seq`.
    ///
    /// Returns true if the write completed inside that call; the flusher
    /// then moves on to the next unit itself.
    pub(crate) fn end_write(&self, seq: u64) -> bool {
        let mut state = self.state.lock();
        if state.in_write != Some(seq) {
            return false;
        }
        state.in_write = None;
        std::mem::take(&mut state.completed_in_write)
    }

    /// Release the flush flag once a write completed.
    ///
    /// Returns whether the caller has to flush again. A completion running
    /// inside the controller call leaves that to the flusher's loop, so
    /// synchronous controllers never nest flushes.
    pub(crate) fn complete(&self) -> bool {
        let mut state = self.state.lock();
        state.flushing = false;
        if state.in_write.is_some() {
            state.completed_in_write = true;
            return false;
        }
        true
    }

    /// Drop everything queued and release the flush flag.
    pub(crate) fn clear(&self) {
        let mut state = self.state.lock();
        state.units.clear();
        state.flushing = false;
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().units.len()
    }

    pub(crate) fn is_flushing(&self) -> bool {
        self.state.lock().flushing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use std::sync::Weak;

    fn control(frame_type: ControlFrameType) -> FrameUnit {
        FrameUnit::Control {
            frame_type,
            bytes: Bytes::from_static(b"x"),
            stream: None,
        }
    }

    fn data(stream: &Arc<Stream>, payload: &'static [u8]) -> FrameUnit {
        FrameUnit::Data(DataUnit {
            stream: stream.clone(),
            data: DataInfo::new(payload, false),
            written: 0,
        })
    }

    #[test]
    fn test_single_flusher() {
        let queue = OutboundQueue::default();
        queue.enqueue(control(ControlFrameType::Ping));
        queue.enqueue(control(ControlFrameType::Settings));

        assert!(queue.poll().is_some());
        assert!(queue.is_flushing());
        assert!(queue.poll().is_none());

        queue.finish();
        assert!(matches!(
            queue.poll(),
            Some(FrameUnit::Control {
                frame_type: ControlFrameType::Settings,
                ..
            })
        ));
    }

    #[test]
    fn test_completion_inside_write_is_left_to_flusher() {
        let queue = OutboundQueue::default();
        queue.enqueue(control(ControlFrameType::Ping));
        assert!(queue.poll().is_some());

        let seq = queue.begin_write();
        assert!(!queue.complete());
        assert!(!queue.is_flushing());
        assert!(queue.end_write(seq));

        // completion after the controller call returned
        queue.enqueue(control(ControlFrameType::Ping));
        assert!(queue.poll().is_some());
        let seq = queue.begin_write();
        assert!(!queue.end_write(seq));
        assert!(queue.complete());
    }

    #[test]
    fn test_stale_write_does_not_claim_newer_one() {
        let queue = OutboundQueue::default();
        let first = queue.begin_write();
        assert!(!queue.complete());
        // another flusher starts a write before the first call returns
        let second = queue.begin_write();

        assert!(!queue.end_write(first));
        assert!(!queue.complete());
        assert!(queue.end_write(second));
    }

    #[test]
    fn test_blocked_data_is_skipped() {
        let blocked = Arc::new(Stream::new(1, Version::V3, 0, 0, Weak::new(), None));
        let queue = OutboundQueue::default();
        queue.enqueue(data(&blocked, b"a"));
        queue.enqueue(control(ControlFrameType::Ping));

        let unit = queue.poll();
        assert!(matches!(unit, Some(FrameUnit::Control { .. })));
        queue.finish();

        assert!(queue.poll().is_none());
        assert!(!queue.is_flushing());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_requeue_keeps_stream_order() {
        let stream = Arc::new(Stream::new(1, Version::V3, 0, 10, Weak::new(), None));
        let queue = OutboundQueue::default();
        queue.enqueue(data(&stream, b"second"));
        queue.enqueue(control(ControlFrameType::Ping));

        queue.requeue(data(&stream, b"first"));

        match queue.poll() {
            Some(FrameUnit::Data(unit)) => assert_eq!(&unit.data.as_bytes()[..], b"first"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
