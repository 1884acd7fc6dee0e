//! Authorship and versioning stamp.

use crate::error::ProtocolError;
use crate::record::{record_wire, Record};
use crate::scalar::Wire;
use bytes::{Buf, BytesMut};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who published a resource, and when.
///
/// Wire layout: `id (16) | author (string) | published (timestamp)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// ID of the resource.
    pub id: Uuid,
    /// Author of the resource.
    pub author: String,
    /// Publication time. Always UTC once transformed.
    pub published: DateTime<FixedOffset>,
}

impl Metadata {
    pub fn new(id: Uuid, author: impl Into<String>, published: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            author: author.into(),
            published,
        }
    }

    /// Creates metadata stamped with the current time.
    pub fn now(id: Uuid, author: impl Into<String>) -> Self {
        Self::new(id, author, Utc::now().fixed_offset())
    }
}

impl Record for Metadata {
    const NAME: &'static str = "Metadata";

    fn transform(&mut self) -> Result<(), ProtocolError> {
        self.published = self.published.with_timezone(&Utc).fixed_offset();
        Ok(())
    }

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.id.encode(buf)?;
        self.author.encode(buf)?;
        self.published.encode(buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: Uuid::decode(buf)?,
            author: String::decode(buf)?,
            published: DateTime::decode(buf)?,
        })
    }
}

record_wire!(Metadata);
