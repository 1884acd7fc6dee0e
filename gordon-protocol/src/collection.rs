//! Count-prefixed sequences and mappings.
//!
//! ```text
//! sequence  u32 count | element * count
//! mapping   u32 count | (key | value) * count
//! ```
//!
//! Elements are not self-describing, so decoding needs a per-element decoder:
//! either the element type's own [`Wire::decode`] or a caller-supplied closure.
//! A count of zero is an empty collection.

use crate::error::ProtocolError;
use crate::scalar::{get_len, put_len, Wire};
use bytes::{Buf, BytesMut};
use std::collections::BTreeMap;

/// Encodes a sequence, preserving element order.
pub fn encode_seq<T: Wire>(items: &[T], buf: &mut BytesMut) -> Result<(), ProtocolError> {
    put_len(buf, items.len())?;
    for item in items {
        item.encode(buf)?;
    }
    Ok(())
}

/// Decodes a sequence using `decode_elem` for every element.
pub fn decode_seq_with<B, T, F>(buf: &mut B, mut decode_elem: F) -> Result<Vec<T>, ProtocolError>
where
    B: Buf,
    F: FnMut(&mut B) -> Result<T, ProtocolError>,
{
    let count = get_len(buf)?;
    // Every element takes at least one byte, so the remaining input bounds
    // how much is worth reserving for a (possibly hostile) count.
    let mut items = Vec::with_capacity(count.min(buf.remaining()));
    for _ in 0..count {
        items.push(decode_elem(buf)?);
    }
    Ok(items)
}

/// Decodes a sequence of `T`.
pub fn decode_seq<B: Buf, T: Wire>(buf: &mut B) -> Result<Vec<T>, ProtocolError> {
    decode_seq_with(buf, T::decode)
}

/// Encodes a mapping as key/value pairs in the map's iteration order.
pub fn encode_map<K: Wire, V: Wire>(
    map: &BTreeMap<K, V>,
    buf: &mut BytesMut,
) -> Result<(), ProtocolError> {
    put_len(buf, map.len())?;
    for (key, value) in map {
        key.encode(buf)?;
        value.encode(buf)?;
    }
    Ok(())
}

/// Decodes a mapping using separate key and value decoders.
///
/// Wire order is only used to pair keys with values; a repeated key keeps
/// the last value read.
pub fn decode_map_with<B, K, V, FK, FV>(
    buf: &mut B,
    mut decode_key: FK,
    mut decode_value: FV,
) -> Result<BTreeMap<K, V>, ProtocolError>
where
    B: Buf,
    K: Ord,
    FK: FnMut(&mut B) -> Result<K, ProtocolError>,
    FV: FnMut(&mut B) -> Result<V, ProtocolError>,
{
    let count = get_len(buf)?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let key = decode_key(buf)?;
        let value = decode_value(buf)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Decodes a mapping of `K` to `V`.
pub fn decode_map<B, K, V>(buf: &mut B) -> Result<BTreeMap<K, V>, ProtocolError>
where
    B: Buf,
    K: Wire + Ord,
    V: Wire,
{
    decode_map_with(buf, K::decode, V::decode)
}

impl<T: Wire> Wire for Vec<T> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        encode_seq(self, buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        decode_seq(buf)
    }
}

impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        encode_map(self, buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        decode_map(buf)
    }
}
