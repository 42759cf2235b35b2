//! Logical frame model.
//!
//! These are the frames the session works with. Turning them into bytes and
//! back is the job of the [`codec`](crate::codec) module; the session treats
//! generated bytes as opaque.

use crate::headers::Headers;
use crate::version::Version;

/// Control frame header size (control bit, version, type, flags, length).
pub const CONTROL_HEADER_LENGTH: usize = 8;

/// Data frame header size (stream id, flags, length).
pub const DATA_HEADER_LENGTH: usize = 8;

/// Largest value the 24-bit length field can carry.
pub const MAX_FRAME_LENGTH: usize = 0x00ff_ffff;

/// Default per-stream flow-control window (64 KiB).
pub const DEFAULT_WINDOW_SIZE: i32 = 65536;

/// Control frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ControlFrameType {
    SynStream = 1,
    SynReply = 2,
    RstStream = 3,
    Settings = 4,
    Noop = 5,
    Ping = 6,
    GoAway = 7,
    Headers = 8,
    WindowUpdate = 9,
}

impl ControlFrameType {
    /// Parse the wire value. Unknown types are `None` and get skipped.
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(Self::SynStream),
            2 => Some(Self::SynReply),
            3 => Some(Self::RstStream),
            4 => Some(Self::Settings),
            5 => Some(Self::Noop),
            6 => Some(Self::Ping),
            7 => Some(Self::GoAway),
            8 => Some(Self::Headers),
            9 => Some(Self::WindowUpdate),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// Frame flags.
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const UNIDIRECTIONAL: u8 = 0x02;
    pub const CLEAR_SETTINGS: u8 = 0x01; // SETTINGS only
}

/// Per-setting flags.
pub mod setting_flags {
    pub const PERSIST_VALUE: u8 = 0x01;
    pub const PERSISTED: u8 = 0x02;
}

/// RST_STREAM status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStatus {
    ProtocolError,
    InvalidStream,
    RefusedStream,
    UnsupportedVersion,
    Cancel,
    InternalError,
    FlowControlError,
    // SPDY/3 only
    StreamInUse,
    StreamAlreadyClosed,
    InvalidCredentials,
    FrameTooLarge,
}

impl StreamStatus {
    /// Wire code for `version`, `None` if the status does not exist there.
    pub fn code(&self, version: Version) -> Option<u32> {
        let code = match self {
            Self::ProtocolError => 1,
            Self::InvalidStream => 2,
            Self::RefusedStream => 3,
            Self::UnsupportedVersion => 4,
            Self::Cancel => 5,
            Self::InternalError => 6,
            Self::FlowControlError => 7,
            Self::StreamInUse => 8,
            Self::StreamAlreadyClosed => 9,
            Self::InvalidCredentials => 10,
            Self::FrameTooLarge => 11,
        };
        if version == Version::V2 && code > 7 {
            return None;
        }
        Some(code)
    }

    /// Parse a wire code received with `version`.
    pub fn from_code(version: Version, code: u32) -> Option<Self> {
        let status = match code {
            1 => Self::ProtocolError,
            2 => Self::InvalidStream,
            3 => Self::RefusedStream,
            4 => Self::UnsupportedVersion,
            5 => Self::Cancel,
            6 => Self::InternalError,
            7 => Self::FlowControlError,
            8 => Self::StreamInUse,
            9 => Self::StreamAlreadyClosed,
            10 => Self::InvalidCredentials,
            11 => Self::FrameTooLarge,
            _ => return None,
        };
        status.code(version).map(|_| status)
    }
}

/// GOAWAY status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SessionStatus {
    Ok = 0,
    ProtocolError = 1,
    InternalError = 2,
}

impl SessionStatus {
    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::ProtocolError),
            2 => Some(Self::InternalError),
            _ => None,
        }
    }
}

/// SETTINGS parameter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    UploadBandwidth,
    DownloadBandwidth,
    RoundTripTime,
    MaxConcurrentStreams,
    CurrentCwnd,
    DownloadRetransRate,
    InitialWindowSize,
    ClientCertificateVectorSize,
    Unknown(u32),
}

impl From<u32> for SettingId {
    fn from(v: u32) -> Self {
        match v {
            1 => Self::UploadBandwidth,
            2 => Self::DownloadBandwidth,
            3 => Self::RoundTripTime,
            4 => Self::MaxConcurrentStreams,
            5 => Self::CurrentCwnd,
            6 => Self::DownloadRetransRate,
            7 => Self::InitialWindowSize,
            8 => Self::ClientCertificateVectorSize,
            other => Self::Unknown(other),
        }
    }
}

impl From<SettingId> for u32 {
    fn from(id: SettingId) -> u32 {
        match id {
            SettingId::UploadBandwidth => 1,
            SettingId::DownloadBandwidth => 2,
            SettingId::RoundTripTime => 3,
            SettingId::MaxConcurrentStreams => 4,
            SettingId::CurrentCwnd => 5,
            SettingId::DownloadRetransRate => 6,
            SettingId::InitialWindowSize => 7,
            SettingId::ClientCertificateVectorSize => 8,
            SettingId::Unknown(v) => v,
        }
    }
}

/// One SETTINGS entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    pub id: SettingId,
    pub flags: u8,
    pub value: u32,
}

impl Setting {
    pub fn new(id: SettingId, value: u32) -> Self {
        Self { id, flags: 0, value }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
}

/// SYN_STREAM: opens a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynStreamFrame {
    pub version: Version,
    pub flags: u8,
    pub stream_id: u32,
    pub associated_stream_id: u32,
    pub priority: u8,
    pub headers: Headers,
}

impl SynStreamFrame {
    pub fn is_close(&self) -> bool {
        (self.flags & flags::FIN) != 0
    }

    pub fn is_unidirectional(&self) -> bool {
        (self.flags & flags::UNIDIRECTIONAL) != 0
    }
}

/// SYN_REPLY: accepts a stream opened by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynReplyFrame {
    pub version: Version,
    pub flags: u8,
    pub stream_id: u32,
    pub headers: Headers,
}

impl SynReplyFrame {
    pub fn is_close(&self) -> bool {
        (self.flags & flags::FIN) != 0
    }
}

/// RST_STREAM: abnormal stream termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RstStreamFrame {
    pub version: Version,
    pub stream_id: u32,
    pub status_code: u32,
}

/// SETTINGS: connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFrame {
    pub version: Version,
    pub flags: u8,
    pub settings: Vec<Setting>,
}

impl SettingsFrame {
    pub fn is_clear_persisted(&self) -> bool {
        (self.flags & flags::CLEAR_SETTINGS) != 0
    }

    /// Value of the last entry with `id`.
    pub fn get(&self, id: SettingId) -> Option<u32> {
        self.settings
            .iter()
            .rev()
            .find(|s| s.id == id)
            .map(|s| s.value)
    }
}

/// NOOP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoopFrame {
    pub version: Version,
}

/// PING: echoed by the receiver when the id parity is not its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFrame {
    pub version: Version,
    pub ping_id: u32,
}

/// GOAWAY: one-shot session teardown announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAwayFrame {
    pub version: Version,
    pub last_stream_id: u32,
    pub status_code: u32,
}

/// HEADERS: additional headers on an open stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersFrame {
    pub version: Version,
    pub flags: u8,
    pub stream_id: u32,
    pub headers: Headers,
}

impl HeadersFrame {
    pub fn is_close(&self) -> bool {
        (self.flags & flags::FIN) != 0
    }
}

/// WINDOW_UPDATE: grants more send window on a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowUpdateFrame {
    pub version: Version,
    pub stream_id: u32,
    pub delta: u32,
}

/// Any control frame, one variant per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    SynStream(SynStreamFrame),
    SynReply(SynReplyFrame),
    RstStream(RstStreamFrame),
    Settings(SettingsFrame),
    Noop(NoopFrame),
    Ping(PingFrame),
    GoAway(GoAwayFrame),
    Headers(HeadersFrame),
    WindowUpdate(WindowUpdateFrame),
}

impl ControlFrame {
    pub fn frame_type(&self) -> ControlFrameType {
        match self {
            Self::SynStream(_) => ControlFrameType::SynStream,
            Self::SynReply(_) => ControlFrameType::SynReply,
            Self::RstStream(_) => ControlFrameType::RstStream,
            Self::Settings(_) => ControlFrameType::Settings,
            Self::Noop(_) => ControlFrameType::Noop,
            Self::Ping(_) => ControlFrameType::Ping,
            Self::GoAway(_) => ControlFrameType::GoAway,
            Self::Headers(_) => ControlFrameType::Headers,
            Self::WindowUpdate(_) => ControlFrameType::WindowUpdate,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            Self::SynStream(f) => f.version,
            Self::SynReply(f) => f.version,
            Self::RstStream(f) => f.version,
            Self::Settings(f) => f.version,
            Self::Noop(f) => f.version,
            Self::Ping(f) => f.version,
            Self::GoAway(f) => f.version,
            Self::Headers(f) => f.version,
            Self::WindowUpdate(f) => f.version,
        }
    }

    /// Stream the frame refers to, if any.
    pub fn stream_id(&self) -> Option<u32> {
        match self {
            Self::SynStream(f) => Some(f.stream_id),
            Self::SynReply(f) => Some(f.stream_id),
            Self::RstStream(f) => Some(f.stream_id),
            Self::Headers(f) => Some(f.stream_id),
            Self::WindowUpdate(f) => Some(f.stream_id),
            Self::Settings(_) | Self::Noop(_) | Self::Ping(_) | Self::GoAway(_) => None,
        }
    }
}

/// Header of a received DATA frame. The payload travels separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFrame {
    pub stream_id: u32,
    pub flags: u8,
    pub length: u32,
}

impl DataFrame {
    pub fn is_close(&self) -> bool {
        (self.flags & flags::FIN) != 0
    }
}
