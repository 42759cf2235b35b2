//! Default SPDY/2 and SPDY/3 wire codec.
//!
//! The session only depends on the [`Generator`] trait and drives a
//! [`ParserListener`]; the implementations here cover the framing layout
//! with uncompressed header blocks. A compressing generator can be swapped
//! in through the trait.
//!
//! ## Frame layout
//!
//! ```text
//! control: |1| version (15) | type (16) | flags (8) | length (24) | payload
//! data:    |0| stream id (31)           | flags (8) | length (24) | payload
//! ```

mod generator;
mod parser;

pub use generator::{Generator, StandardGenerator, DEFAULT_MAX_DATA_FRAME_SIZE};
pub use parser::{Parser, ParserListener};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::headers::Headers;
use crate::version::Version;

/// Write a 24-bit length.
fn put_u24(buf: &mut BytesMut, value: usize) {
    buf.put_u8((value >> 16) as u8);
    buf.put_u8((value >> 8) as u8);
    buf.put_u8(value as u8);
}

/// Read a 24-bit length from the first three bytes of `buf`.
fn read_u24(buf: &[u8]) -> usize {
    ((buf[0] as usize) << 16) | ((buf[1] as usize) << 8) | (buf[2] as usize)
}

/// Encode a header block: entry count, then length-prefixed name/value pairs.
///
/// SPDY/2 uses 16-bit counts and lengths, SPDY/3 uses 32-bit ones.
fn encode_header_block(version: Version, headers: &Headers, buf: &mut BytesMut) -> Result<(), String> {
    match version {
        Version::V2 => {
            let count = u16::try_from(headers.len())
                .map_err(|_| format!("too many headers for {}: {}", version, headers.len()))?;
            buf.put_u16(count);
            for (name, value) in headers.iter() {
                for field in [name, value] {
                    let len = u16::try_from(field.len())
                        .map_err(|_| format!("header field too long for {}: {}", version, field.len()))?;
                    buf.put_u16(len);
                    buf.put_slice(field.as_bytes());
                }
            }
        }
        Version::V3 => {
            buf.put_u32(headers.len() as u32);
            for (name, value) in headers.iter() {
                for field in [name, value] {
                    buf.put_u32(field.len() as u32);
                    buf.put_slice(field.as_bytes());
                }
            }
        }
    }
    Ok(())
}

/// Decode a header block written by [`encode_header_block`].
fn decode_header_block(version: Version, payload: &mut Bytes) -> Result<Headers, String> {
    let read_len = |payload: &mut Bytes| -> Result<usize, String> {
        match version {
            Version::V2 if payload.remaining() >= 2 => Ok(payload.get_u16() as usize),
            Version::V3 if payload.remaining() >= 4 => Ok(payload.get_u32() as usize),
            _ => Err("truncated header block".to_string()),
        }
    };
    let read_field = |payload: &mut Bytes| -> Result<String, String> {
        let len = read_len(payload)?;
        if payload.remaining() < len {
            return Err(format!("header field length {} exceeds payload", len));
        }
        let raw = payload.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| "header field is not UTF-8".to_string())
    };

    let count = read_len(payload)?;
    let mut headers = Headers::new();
    for _ in 0..count {
        let name = read_field(payload)?;
        if name.is_empty() {
            return Err("empty header name".to_string());
        }
        let value = read_field(payload)?;
        headers.add(name, value);
    }
    Ok(headers)
}
