//! Application-facing descriptions of what to send or what was received.

use bytes::Bytes;

use crate::frame::{flags, Setting, SettingId, SessionStatus, StreamStatus};
use crate::headers::Headers;

/// Request to open a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynInfo {
    pub headers: Headers,
    /// Half-close the local side with the SYN itself.
    pub close: bool,
    pub unidirectional: bool,
    pub associated_stream_id: u32,
    pub priority: u8,
}

impl SynInfo {
    pub fn new(headers: Headers, close: bool) -> Self {
        Self {
            headers,
            close,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// SYN_STREAM flags for this request.
    pub fn flags(&self) -> u8 {
        let mut bits = 0;
        if self.close {
            bits |= flags::FIN;
        }
        if self.unidirectional {
            bits |= flags::UNIDIRECTIONAL;
        }
        bits
    }
}

/// Headers of a SYN_REPLY, sent or received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyInfo {
    pub headers: Headers,
    pub close: bool,
}

impl ReplyInfo {
    pub fn new(headers: Headers, close: bool) -> Self {
        Self { headers, close }
    }

    pub fn flags(&self) -> u8 {
        if self.close {
            flags::FIN
        } else {
            0
        }
    }
}

/// Headers of a HEADERS frame, sent or received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadersInfo {
    pub headers: Headers,
    pub close: bool,
}

impl HeadersInfo {
    pub fn new(headers: Headers, close: bool) -> Self {
        Self { headers, close }
    }

    pub fn flags(&self) -> u8 {
        if self.close {
            flags::FIN
        } else {
            0
        }
    }
}

/// Payload for a stream, consumed chunk by chunk as the window allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataInfo {
    data: Bytes,
    close: bool,
}

impl DataInfo {
    pub fn new(data: impl Into<Bytes>, close: bool) -> Self {
        Self {
            data: data.into(),
            close,
        }
    }

    /// Bytes not yet consumed.
    pub fn available(&self) -> usize {
        self.data.len()
    }

    pub fn is_consumed(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the local side closes once this payload is fully written.
    pub fn is_close(&self) -> bool {
        self.close
    }

    /// Take up to `n` bytes from the front.
    pub fn consume(&mut self, n: usize) -> Bytes {
        let n = n.min(self.data.len());
        self.data.split_to(n)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Request to reset a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RstInfo {
    pub stream_id: u32,
    pub status: StreamStatus,
}

impl RstInfo {
    pub fn new(stream_id: u32, status: StreamStatus) -> Self {
        Self { stream_id, status }
    }
}

/// Settings to send, or settings received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsInfo {
    pub settings: Vec<Setting>,
    pub clear_persisted: bool,
}

impl SettingsInfo {
    pub fn new(settings: Vec<Setting>) -> Self {
        Self {
            settings,
            clear_persisted: false,
        }
    }

    pub fn get(&self, id: SettingId) -> Option<u32> {
        self.settings
            .iter()
            .rev()
            .find(|s| s.id == id)
            .map(|s| s.value)
    }

    pub fn flags(&self) -> u8 {
        if self.clear_persisted {
            flags::CLEAR_SETTINGS
        } else {
            0
        }
    }
}

/// A sent or received PING.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingInfo {
    pub ping_id: u32,
}

/// A received GOAWAY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoAwayInfo {
    pub last_stream_id: u32,
    pub status: SessionStatus,
}
