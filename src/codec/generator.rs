//! Frame generation.

use bytes::{BufMut, Bytes, BytesMut};

use super::{encode_header_block, put_u24};
use crate::error::{Error, Result};
use crate::frame::{
    flags, ControlFrame, CONTROL_HEADER_LENGTH, DATA_HEADER_LENGTH, MAX_FRAME_LENGTH,
};
use crate::session::DataInfo;
use crate::version::Version;

/// Default upper bound on a single DATA frame payload.
pub const DEFAULT_MAX_DATA_FRAME_SIZE: usize = 16384;

/// Turns logical frames into wire bytes.
///
/// The session calls these from whichever thread triggered the operation, so
/// implementations must be `Send + Sync`.
pub trait Generator: Send + Sync {
    /// Encode a control frame, header included.
    fn control(&self, frame: &ControlFrame) -> Result<Bytes>;

    /// Encode one DATA frame for `stream_id`, consuming at most `window`
    /// bytes from `data`. FIN is set when this frame carries the last of a
    /// payload marked `close`.
    fn data(&self, stream_id: u32, window: i32, data: &mut DataInfo) -> Result<Bytes>;
}

/// Generator for the SPDY/2 and SPDY/3 layout without header compression.
#[derive(Debug, Clone)]
pub struct StandardGenerator {
    max_data_frame_size: usize,
}

impl StandardGenerator {
    pub fn new() -> Self {
        Self {
            max_data_frame_size: DEFAULT_MAX_DATA_FRAME_SIZE,
        }
    }

    /// Cap the payload of each generated DATA frame.
    pub fn with_max_data_frame_size(mut self, size: usize) -> Self {
        self.max_data_frame_size = size.clamp(1, MAX_FRAME_LENGTH);
        self
    }

    pub fn max_data_frame_size(&self) -> usize {
        self.max_data_frame_size
    }

    fn encode_payload(frame: &ControlFrame, buf: &mut BytesMut) -> Result<u8> {
        let version = frame.version();
        let flags = match frame {
            ControlFrame::SynStream(f) => {
                buf.put_u32(f.stream_id & 0x7fff_ffff);
                buf.put_u32(f.associated_stream_id & 0x7fff_ffff);
                match version {
                    Version::V2 => buf.put_u8((f.priority & 0x03) << 6),
                    Version::V3 => buf.put_u8((f.priority & 0x07) << 5),
                }
                // v2 unused byte, v3 credential slot
                buf.put_u8(0);
                encode_header_block(version, &f.headers, buf).map_err(Error::generation)?;
                f.flags
            }
            ControlFrame::SynReply(f) => {
                buf.put_u32(f.stream_id & 0x7fff_ffff);
                if version == Version::V2 {
                    buf.put_u16(0);
                }
                encode_header_block(version, &f.headers, buf).map_err(Error::generation)?;
                f.flags
            }
            ControlFrame::RstStream(f) => {
                buf.put_u32(f.stream_id & 0x7fff_ffff);
                buf.put_u32(f.status_code);
                0
            }
            ControlFrame::Settings(f) => {
                buf.put_u32(f.settings.len() as u32);
                for setting in &f.settings {
                    let id: u32 = setting.id.into();
                    if id > 0x00ff_ffff {
                        return Err(Error::generation(format!("setting id {} exceeds 24 bits", id)));
                    }
                    buf.put_u8(setting.flags);
                    put_u24(buf, id as usize);
                    buf.put_u32(setting.value);
                }
                f.flags
            }
            ControlFrame::Noop(_) => 0,
            ControlFrame::Ping(f) => {
                buf.put_u32(f.ping_id);
                0
            }
            ControlFrame::GoAway(f) => {
                buf.put_u32(f.last_stream_id & 0x7fff_ffff);
                if version == Version::V3 {
                    buf.put_u32(f.status_code);
                }
                0
            }
            ControlFrame::Headers(f) => {
                buf.put_u32(f.stream_id & 0x7fff_ffff);
                if version == Version::V2 {
                    buf.put_u16(0);
                }
                encode_header_block(version, &f.headers, buf).map_err(Error::generation)?;
                f.flags
            }
            ControlFrame::WindowUpdate(f) => {
                buf.put_u32(f.stream_id & 0x7fff_ffff);
                buf.put_u32(f.delta & 0x7fff_ffff);
                0
            }
        };
        Ok(flags)
    }
}

impl Default for StandardGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for StandardGenerator {
    fn control(&self, frame: &ControlFrame) -> Result<Bytes> {
        let mut payload = BytesMut::new();
        let flags = Self::encode_payload(frame, &mut payload)?;
        if payload.len() > MAX_FRAME_LENGTH {
            return Err(Error::generation(format!(
                "{:?} payload too large: {} bytes",
                frame.frame_type(),
                payload.len()
            )));
        }

        let mut buf = BytesMut::with_capacity(CONTROL_HEADER_LENGTH + payload.len());
        buf.put_u16(0x8000 | frame.version().as_u16());
        buf.put_u16(frame.frame_type().code());
        buf.put_u8(flags);
        put_u24(&mut buf, payload.len());
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    fn data(&self, stream_id: u32, window: i32, data: &mut DataInfo) -> Result<Bytes> {
        if window < 0 {
            return Err(Error::generation(format!(
                "negative window {} for stream {}",
                window, stream_id
            )));
        }
        let size = (window as usize)
            .min(self.max_data_frame_size)
            .min(data.available());
        let chunk = data.consume(size);

        let mut frame_flags = 0;
        if data.is_consumed() && data.is_close() {
            frame_flags |= flags::FIN;
        }

        let mut buf = BytesMut::with_capacity(DATA_HEADER_LENGTH + chunk.len());
        buf.put_u32(stream_id & 0x7fff_ffff);
        buf.put_u8(frame_flags);
        put_u24(&mut buf, chunk.len());
        buf.put_slice(&chunk);
        Ok(buf.freeze())
    }
}
