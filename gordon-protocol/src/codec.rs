//! Encoder and decoder for framed requests and pages.

use crate::error::ProtocolError;
use crate::frame::{Frame, FRAME_HEADER_SIZE};
use crate::page::Page;
use crate::record::Record;
use crate::request::Request;
use crate::MAX_PAYLOAD_SIZE;
use bytes::{BufMut, BytesMut};

/// Encodes requests and pages into frames.
pub struct Encoder;

impl Encoder {
    /// Encodes a request into a frame.
    pub fn encode_request(request: &Request) -> Result<BytesMut, ProtocolError> {
        Self::encode_record(request)
    }

    /// Encodes a response page into a frame.
    pub fn encode_page(page: &Page) -> Result<BytesMut, ProtocolError> {
        Self::encode_record(page)
    }

    /// Encodes any record into a frame.
    pub fn encode_record<R: Record>(record: &R) -> Result<BytesMut, ProtocolError> {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_u32(0);
        record.marshall(&mut buf)?;

        let len = buf.len() - FRAME_HEADER_SIZE;
        if len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        buf[..FRAME_HEADER_SIZE].copy_from_slice(&(len as u32).to_be_bytes());
        Ok(buf)
    }
}

/// Decodes frames into requests and pages.
pub struct Decoder {
    buffer: BytesMut,
    max_payload: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_SIZE)
    }

    /// Creates a decoder that rejects frames longer than `max_payload`.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            max_payload,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next frame from the buffer.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        Frame::decode(&mut self.buffer, self.max_payload)
    }

    /// Attempts to decode the next request from the buffer.
    pub fn decode_request(&mut self) -> Result<Option<Request>, ProtocolError> {
        self.decode_record()
    }

    /// Attempts to decode the next page from the buffer.
    pub fn decode_page(&mut self) -> Result<Option<Page>, ProtocolError> {
        self.decode_record()
    }

    /// Attempts to decode the next record of type `R`.
    ///
    /// The whole frame payload must be consumed by the record.
    pub fn decode_record<R: Record>(&mut self) -> Result<Option<R>, ProtocolError> {
        match self.decode_frame()? {
            Some(frame) => {
                let mut payload = frame.payload;
                let record = R::unmarshall(&mut payload)?;
                if !payload.is_empty() {
                    return Err(ProtocolError::TrailingBytes(payload.len()));
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
