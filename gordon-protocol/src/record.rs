//! Fixed-schema records.
//!
//! A record is written as its fields in declaration order with no tags.
//! Both directions pass through the same gate:
//!
//! - `marshall`: transform, validate, then write. Nothing is written if the
//!   gate fails, and a failure part-way through the fields rolls the buffer
//!   back to where it started.
//! - `unmarshall`: read every field (stopping at the first failure), then
//!   transform and validate what was read.
//!
//! A caller therefore never sees an invalid record, whether it was built
//! locally or received from a peer.

use crate::error::{ProtocolError, ValidationErrors};
use bytes::{Buf, BytesMut};

/// A composite value with normalization and validation rules.
pub trait Record: Clone + Sized {
    /// Name used in validation errors.
    const NAME: &'static str;

    /// Rewrites the value into canonical form.
    fn transform(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Adds every violated rule to `errors`.
    fn check(&self, _errors: &mut ValidationErrors) {}

    /// Writes the fields in declaration order.
    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError>;

    /// Reads the fields in declaration order.
    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError>;

    /// Checks every rule, reporting all violations together.
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new(Self::NAME);
        self.check(&mut errors);
        errors.into_result()
    }

    /// Encodes a normalized copy of this record.
    fn marshall(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let mut canonical = self.clone();
        canonical.transform()?;
        canonical.validate()?;

        let start = buf.len();
        if let Err(e) = canonical.write_fields(buf) {
            buf.truncate(start);
            return Err(e);
        }
        Ok(())
    }

    /// Decodes, normalizes and validates a record.
    fn unmarshall<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        let mut record = Self::read_fields(buf)?;
        record.transform()?;
        record.validate()?;
        Ok(record)
    }
}

/// Lets records nest inside other records and collections.
macro_rules! record_wire {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::scalar::Wire for $ty {
                fn encode(&self, buf: &mut ::bytes::BytesMut) -> Result<(), $crate::ProtocolError> {
                    $crate::record::Record::marshall(self, buf)
                }

                fn decode<B: ::bytes::Buf>(buf: &mut B) -> Result<Self, $crate::ProtocolError> {
                    <$ty as $crate::record::Record>::unmarshall(buf)
                }
            }
        )+
    };
}

pub(crate) use record_wire;
