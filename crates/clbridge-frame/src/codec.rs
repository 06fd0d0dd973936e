use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Longest accepted length line, excluding the terminating newline.
/// `u64::MAX` is 20 digits; anything longer is stream corruption.
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Encode one message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────────────┬──────┬──────────────────┐
/// │ Length (ASCII dec)│ '\n' │ Payload (N bytes)│
/// └───────────────────┴──────┴──────────────────┘
/// ```
/// There is no delimiter after the payload.
pub fn encode_message(payload: &[u8], dst: &mut BytesMut) {
    let header = payload.len().to_string();
    dst.reserve(header.len() + 1 + payload.len());
    dst.put_slice(header.as_bytes());
    dst.put_u8(b'\n');
    dst.put_slice(payload);
}

/// Decode one message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message
/// yet. On success, consumes the message bytes from the buffer and
/// returns the payload as text.
pub fn decode_message(src: &mut BytesMut, max_payload: usize) -> Result<Option<String>> {
    let newline = match src.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None if src.len() > MAX_LENGTH_DIGITS => {
            return Err(invalid_length(&src[..MAX_LENGTH_DIGITS]));
        }
        None => return Ok(None), // Need more data
    };

    let header = &src[..newline];
    if header.is_empty()
        || header.len() > MAX_LENGTH_DIGITS
        || !header.iter().all(u8::is_ascii_digit)
    {
        return Err(invalid_length(header));
    }
    // All-digit ASCII within 20 chars; only u64 overflow can fail.
    let payload_len: usize = std::str::from_utf8(header)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| invalid_length(header))?;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = newline + 1 + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(newline + 1);
    let payload = src.split_to(payload_len);
    Ok(Some(String::from_utf8(payload.to_vec())?))
}

fn invalid_length(header: &[u8]) -> FrameError {
    FrameError::InvalidLength(String::from_utf8_lossy(header).into_owned())
}

/// Configuration for the message codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
