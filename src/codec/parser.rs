//! Incremental frame parser.

use bytes::{Buf, Bytes, BytesMut};

use super::{decode_header_block, read_u24};
use crate::error::{SessionException, StreamException};
use crate::frame::{
    ControlFrame, ControlFrameType, DataFrame, GoAwayFrame, HeadersFrame, NoopFrame, PingFrame,
    RstStreamFrame, Setting, SettingId, SettingsFrame, StreamStatus, SynReplyFrame,
    SessionStatus, SynStreamFrame, WindowUpdateFrame, CONTROL_HEADER_LENGTH, DATA_HEADER_LENGTH,
};
use crate::version::Version;

/// Inbound callback surface fed by [`Parser`].
pub trait ParserListener {
    fn on_control_frame(&self, frame: ControlFrame);

    fn on_data_frame(&self, frame: DataFrame, data: Bytes);

    /// A frame for a single stream was malformed.
    fn on_stream_exception(&self, error: StreamException);

    /// The framing itself is broken; the connection cannot continue.
    fn on_session_exception(&self, error: SessionException);
}

/// Accumulates raw input and emits complete frames.
///
/// After a session exception the parser stops and discards further input.
#[derive(Debug, Default)]
pub struct Parser {
    buffer: BytesMut,
    failed: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session exception has been raised.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Feed `input` and dispatch every complete frame to `listener`.
    pub fn parse<L>(&mut self, input: &[u8], listener: &L)
    where
        L: ParserListener + ?Sized,
    {
        if self.failed {
            return;
        }
        self.buffer.extend_from_slice(input);

        // both header kinds share the length field position
        debug_assert_eq!(CONTROL_HEADER_LENGTH, DATA_HEADER_LENGTH);
        while self.buffer.len() >= CONTROL_HEADER_LENGTH {
            let length = read_u24(&self.buffer[5..8]);
            let total = CONTROL_HEADER_LENGTH + length;
            if self.buffer.len() < total {
                break;
            }

            let mut frame = self.buffer.split_to(total).freeze();
            let control = (frame[0] & 0x80) != 0;
            if control {
                self.parse_control(&mut frame, listener);
            } else {
                self.parse_data(&mut frame, listener);
            }
            if self.failed {
                self.buffer.clear();
                return;
            }
        }
    }

    fn parse_control<L>(&mut self, frame: &mut Bytes, listener: &L)
    where
        L: ParserListener + ?Sized,
    {
        let raw_version = frame.get_u16() & 0x7fff;
        let raw_type = frame.get_u16();
        let flags = frame.get_u8();
        frame.advance(3);

        let Some(version) = Version::from_u16(raw_version) else {
            self.fail(
                listener,
                SessionException::new(
                    SessionStatus::ProtocolError,
                    format!("unsupported version {}", raw_version),
                ),
            );
            return;
        };
        let Some(frame_type) = ControlFrameType::from_u16(raw_type) else {
            tracing::debug!("Skipping unknown control frame type {}", raw_type);
            return;
        };

        let stream_id = peek_stream_id(frame_type, frame);
        match decode_control(version, frame_type, flags, frame) {
            Ok(control) => listener.on_control_frame(control),
            Err(message) => match stream_id {
                Some(id) if id != 0 => {
                    listener.on_stream_exception(StreamException::new(
                        id,
                        StreamStatus::ProtocolError,
                        format!("malformed {:?}: {}", frame_type, message),
                    ));
                }
                _ => self.fail(
                    listener,
                    SessionException::new(
                        SessionStatus::ProtocolError,
                        format!("malformed {:?}: {}", frame_type, message),
                    ),
                ),
            },
        }
    }

    fn parse_data<L>(&mut self, frame: &mut Bytes, listener: &L)
    where
        L: ParserListener + ?Sized,
    {
        let stream_id = frame.get_u32() & 0x7fff_ffff;
        let flags = frame.get_u8();
        let length = read_u24(&frame[..3]) as u32;
        frame.advance(3);

        if stream_id == 0 {
            self.fail(
                listener,
                SessionException::new(SessionStatus::ProtocolError, "data frame on stream 0"),
            );
            return;
        }
        let data = frame.split_to(length as usize);
        listener.on_data_frame(
            DataFrame {
                stream_id,
                flags,
                length,
            },
            data,
        );
    }

    fn fail<L>(&mut self, listener: &L, error: SessionException)
    where
        L: ParserListener + ?Sized,
    {
        self.failed = true;
        listener.on_session_exception(error);
    }
}

/// Stream id of a stream-scoped frame, read without consuming the payload.
fn peek_stream_id(frame_type: ControlFrameType, payload: &Bytes) -> Option<u32> {
    match frame_type {
        ControlFrameType::SynStream
        | ControlFrameType::SynReply
        | ControlFrameType::RstStream
        | ControlFrameType::Headers
        | ControlFrameType::WindowUpdate
            if payload.len() >= 4 =>
        {
            let raw = [payload[0], payload[1], payload[2], payload[3]];
            Some(u32::from_be_bytes(raw) & 0x7fff_ffff)
        }
        _ => None,
    }
}

fn need(payload: &Bytes, n: usize) -> Result<(), String> {
    if payload.remaining() < n {
        return Err(format!("expected {} more bytes, found {}", n, payload.remaining()));
    }
    Ok(())
}

fn decode_control(
    version: Version,
    frame_type: ControlFrameType,
    flags: u8,
    payload: &mut Bytes,
) -> Result<ControlFrame, String> {
    let frame = match frame_type {
        ControlFrameType::SynStream => {
            need(payload, 10)?;
            let stream_id = payload.get_u32() & 0x7fff_ffff;
            let associated_stream_id = payload.get_u32() & 0x7fff_ffff;
            let priority = match version {
                Version::V2 => payload.get_u8() >> 6,
                Version::V3 => payload.get_u8() >> 5,
            };
            payload.advance(1);
            let headers = decode_header_block(version, payload)?;
            ControlFrame::SynStream(SynStreamFrame {
                version,
                flags,
                stream_id,
                associated_stream_id,
                priority,
                headers,
            })
        }
        ControlFrameType::SynReply => {
            need(payload, 4)?;
            let stream_id = payload.get_u32() & 0x7fff_ffff;
            if version == Version::V2 {
                need(payload, 2)?;
                payload.advance(2);
            }
            let headers = decode_header_block(version, payload)?;
            ControlFrame::SynReply(SynReplyFrame {
                version,
                flags,
                stream_id,
                headers,
            })
        }
        ControlFrameType::RstStream => {
            need(payload, 8)?;
            ControlFrame::RstStream(RstStreamFrame {
                version,
                stream_id: payload.get_u32() & 0x7fff_ffff,
                status_code: payload.get_u32(),
            })
        }
        ControlFrameType::Settings => {
            need(payload, 4)?;
            let count = payload.get_u32() as usize;
            need(payload, count.saturating_mul(8))?;
            let mut settings = Vec::with_capacity(count);
            for _ in 0..count {
                let setting_flags = payload.get_u8();
                let id = read_u24(&payload[..3]) as u32;
                payload.advance(3);
                let value = payload.get_u32();
                settings.push(Setting::new(SettingId::from(id), value).with_flags(setting_flags));
            }
            ControlFrame::Settings(SettingsFrame {
                version,
                flags,
                settings,
            })
        }
        ControlFrameType::Noop => ControlFrame::Noop(NoopFrame { version }),
        ControlFrameType::Ping => {
            need(payload, 4)?;
            ControlFrame::Ping(PingFrame {
                version,
                ping_id: payload.get_u32(),
            })
        }
        ControlFrameType::GoAway => {
            need(payload, 4)?;
            let last_stream_id = payload.get_u32() & 0x7fff_ffff;
            let status_code = match version {
                Version::V2 => 0,
                Version::V3 => {
                    need(payload, 4)?;
                    payload.get_u32()
                }
            };
            ControlFrame::GoAway(GoAwayFrame {
                version,
                last_stream_id,
                status_code,
            })
        }
        ControlFrameType::Headers => {
            need(payload, 4)?;
            let stream_id = payload.get_u32() & 0x7fff_ffff;
            if version == Version::V2 {
                need(payload, 2)?;
                payload.advance(2);
            }
            let headers = decode_header_block(version, payload)?;
            ControlFrame::Headers(HeadersFrame {
                version,
                flags,
                stream_id,
                headers,
            })
        }
        ControlFrameType::WindowUpdate => {
            need(payload, 8)?;
            ControlFrame::WindowUpdate(WindowUpdateFrame {
                version,
                stream_id: payload.get_u32() & 0x7fff_ffff,
                delta: payload.get_u32() & 0x7fff_ffff,
            })
        }
    };
    Ok(frame)
}
