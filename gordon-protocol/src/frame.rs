//! Length-prefixed frames.
//!
//! Every request and response travels as one frame:
//!
//! ```text
//! +----------------+---------------------------+
//! | payload_len    | payload                   |
//! | 4 bytes (u32)  | payload_len bytes         |
//! +----------------+---------------------------+
//! ```
//!
//! The prefix lets a reader reject an oversized payload before reading it,
//! rather than truncating it into an undecodable request.

use crate::error::ProtocolError;
use crate::MAX_PAYLOAD_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// A single framed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let len = self.payload.len();
        if len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + len);
        buf.put_u32(len as u32);
        buf.put_slice(&self.payload);
        Ok(buf)
    }

    /// Reads the payload length from a frame header without consuming it.
    ///
    /// Returns `None` if fewer than [`FRAME_HEADER_SIZE`] bytes are buffered.
    pub fn peek_len(buf: &[u8]) -> Option<usize> {
        let header: [u8; FRAME_HEADER_SIZE] = buf.get(..FRAME_HEADER_SIZE)?.try_into().ok()?;
        Some(u32::from_be_bytes(header) as usize)
    }

    /// Decodes a frame from bytes, refusing payloads longer than `max`.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded,
    /// `Ok(None)` if more data is needed, or `Err` as soon as the header
    /// announces an oversized payload.
    pub fn decode(buf: &mut BytesMut, max: usize) -> Result<Option<Self>, ProtocolError> {
        let Some(len) = Self::peek_len(buf) else {
            return Ok(None);
        };

        if len > max {
            return Err(ProtocolError::FrameTooLarge { size: len, max });
        }

        if buf.len() < FRAME_HEADER_SIZE + len {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(len).freeze();
        Ok(Some(Self { payload }))
    }
}
