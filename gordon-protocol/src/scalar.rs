//! Scalar wire values.
//!
//! Layouts (integers are big-endian):
//!
//! ```text
//! bool       1 byte, 0 or 1
//! u8         1 byte
//! bytes      u32 length | raw bytes
//! string     u32 length | UTF-8 bytes
//! uuid       16 bytes
//! timestamp  i64 seconds since epoch | u32 nanoseconds
//! ```
//!
//! Nothing is compressed or tagged; the schema is fixed by the record being
//! read, so only variable-sized values carry a length.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

/// Size of a length or count prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of an encoded identifier.
pub const UUID_SIZE: usize = 16;

/// Size of an encoded timestamp (8 bytes seconds + 4 bytes nanoseconds).
pub const TIMESTAMP_SIZE: usize = 12;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A value with a fixed wire representation.
pub trait Wire: Sized {
    /// Appends the encoded value to `buf`.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError>;

    /// Reads one value from the front of `buf`.
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError>;
}

/// Fails with `UnexpectedEof` unless `buf` holds at least `needed` bytes.
pub fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<(), ProtocolError> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(ProtocolError::UnexpectedEof { needed, remaining });
    }
    Ok(())
}

/// Writes a u32 length or element-count prefix.
pub fn put_len(buf: &mut BytesMut, len: usize) -> Result<(), ProtocolError> {
    let len = u32::try_from(len).map_err(|_| ProtocolError::LengthOverflow(len))?;
    buf.put_u32(len);
    Ok(())
}

/// Reads a u32 length or element-count prefix.
pub fn get_len<B: Buf>(buf: &mut B) -> Result<usize, ProtocolError> {
    ensure_remaining(buf, LENGTH_PREFIX_SIZE)?;
    Ok(buf.get_u32() as usize)
}

impl Wire for bool {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_u8(u8::from(*self));
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        match u8::decode(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidBool(other)),
        }
    }
}

impl Wire for u8 {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_u8(*self);
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        ensure_remaining(buf, 1)?;
        Ok(buf.get_u8())
    }
}

impl Wire for Bytes {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        put_len(buf, self.len())?;
        buf.put_slice(self);
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        let len = get_len(buf)?;
        ensure_remaining(buf, len)?;
        Ok(buf.copy_to_bytes(len))
    }
}

impl Wire for String {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        put_len(buf, self.len())?;
        buf.put_slice(self.as_bytes());
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        let len = get_len(buf)?;
        ensure_remaining(buf, len)?;
        let mut raw = vec![0u8; len];
        buf.copy_to_slice(&mut raw);
        String::from_utf8(raw).map_err(|_| ProtocolError::InvalidUtf8)
    }
}

impl Wire for Uuid {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_slice(self.as_bytes());
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        ensure_remaining(buf, UUID_SIZE)?;
        let mut raw = [0u8; UUID_SIZE];
        buf.copy_to_slice(&mut raw);
        Ok(Uuid::from_bytes(raw))
    }
}

impl Wire for DateTime<Utc> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let secs = self.timestamp();
        let nanos = self.timestamp_subsec_nanos();
        // Leap-second instants carry nanos >= 1e9 and have no portable form.
        if nanos >= NANOS_PER_SEC {
            return Err(ProtocolError::InvalidTimestamp { secs, nanos });
        }
        buf.put_i64(secs);
        buf.put_u32(nanos);
        Ok(())
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        ensure_remaining(buf, TIMESTAMP_SIZE)?;
        let secs = buf.get_i64();
        let nanos = buf.get_u32();
        if nanos >= NANOS_PER_SEC {
            return Err(ProtocolError::InvalidTimestamp { secs, nanos });
        }
        DateTime::<Utc>::from_timestamp(secs, nanos)
            .ok_or(ProtocolError::InvalidTimestamp { secs, nanos })
    }
}

/// Offset-carrying timestamps are written as the same instant in UTC; the
/// offset itself does not travel and decodes as `+00:00`.
impl Wire for DateTime<FixedOffset> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.with_timezone(&Utc).encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(DateTime::<Utc>::decode(buf)?.fixed_offset())
    }
}
