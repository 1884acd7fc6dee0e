//! References between documents.

use crate::enums::Predicate;
use crate::error::ProtocolError;
use crate::record::{record_wire, Record};
use crate::scalar::Wire;
use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to a page, optionally narrowed to one of its sections and
/// optionally hosted on another server. Empty strings mean "not set".
///
/// Wire layout: `page (16) | section (string) | server (string)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRef {
    pub page: Uuid,
    pub section: String,
    pub server: String,
}

impl PageRef {
    /// References a whole page on the same server.
    pub fn to_page(page: Uuid) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }
}

impl Record for PageRef {
    const NAME: &'static str = "PageRef";

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.page.encode(buf)?;
        self.section.encode(buf)?;
        self.server.encode(buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            page: Uuid::decode(buf)?,
            section: String::decode(buf)?,
            server: String::decode(buf)?,
        })
    }
}

/// A directed semantic edge: `subject predicate object`.
///
/// Wire layout: `subject (PageRef) | predicate (1) | object (PageRef)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub subject: PageRef,
    pub predicate: Predicate,
    pub object: PageRef,
}

impl Relationship {
    pub fn new(subject: PageRef, predicate: Predicate, object: PageRef) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl Record for Relationship {
    const NAME: &'static str = "Relationship";

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.subject.encode(buf)?;
        self.predicate.encode(buf)?;
        self.object.encode(buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            subject: PageRef::decode(buf)?,
            predicate: Predicate::decode(buf)?,
            object: PageRef::decode(buf)?,
        })
    }
}

record_wire!(PageRef, Relationship);
