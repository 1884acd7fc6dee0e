//! Pages: the unit of storage and transfer.

use crate::collection::{decode_map, decode_seq, encode_map, encode_seq};
use crate::enums::Status;
use crate::error::{ProtocolError, ValidationErrors};
use crate::link::{PageRef, Relationship};
use crate::metadata::Metadata;
use crate::record::{record_wire, Record};
use crate::scalar::Wire;
use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum page title length, in characters.
pub const TITLE_MAX_LEN: usize = 512;

/// A titled body of content within a page.
///
/// Wire layout: `title (string) | body (string)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub title: String,
    pub body: String,
}

impl Section {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl Record for Section {
    const NAME: &'static str = "Section";

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.title.encode(buf)?;
        self.body.encode(buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            title: String::decode(buf)?,
            body: String::decode(buf)?,
        })
    }
}

/// A document.
///
/// Wire layout, in order:
///
/// ```text
/// meta | history[] | title | preamble | sections[] | tags[] | labels{} |
/// links[] | relationships[] | status (1)
/// ```
///
/// Empty collections are written as a zero count and decode back to empty
/// collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    /// Author, revision and date of this page.
    pub meta: Metadata,
    /// Metadata of previous versions of this page, if any are known.
    pub history: Vec<Metadata>,
    /// Between 1 and 512 characters.
    pub title: String,
    /// Short summary, used on indexes and other listings.
    pub preamble: String,
    pub sections: Vec<Section>,
    /// Free-form tags for searching and organising.
    pub tags: Vec<String>,
    /// Free-form key/value labels for searching and organising.
    pub labels: BTreeMap<String, String>,
    /// References to other pages. Section bodies refer to them by index.
    pub links: Vec<PageRef>,
    pub relationships: Vec<Relationship>,
    /// Whether this page describes an error.
    pub status: Status,
}

impl Page {
    /// Creates an OK page with the given title.
    pub fn new(meta: Metadata, title: impl Into<String>) -> Self {
        Self {
            meta,
            title: title.into(),
            status: Status::Ok,
            ..Default::default()
        }
    }

    /// Creates an error page whose title describes the problem.
    pub fn error(meta: Metadata, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            ..Self::new(meta, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }
}

impl Record for Page {
    const NAME: &'static str = "Page";

    fn transform(&mut self) -> Result<(), ProtocolError> {
        self.meta.transform()?;
        for meta in &mut self.history {
            meta.transform()?;
        }
        Ok(())
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if self.title.is_empty() {
            errors.push("Title", "must not be empty");
        }
        let len = self.title.chars().count();
        if len > TITLE_MAX_LEN {
            errors.push(
                "Title",
                format!("must be at most {} characters (got {})", TITLE_MAX_LEN, len),
            );
        }
    }

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.meta.encode(buf)?;
        encode_seq(&self.history, buf)?;
        self.title.encode(buf)?;
        self.preamble.encode(buf)?;
        encode_seq(&self.sections, buf)?;
        encode_seq(&self.tags, buf)?;
        encode_map(&self.labels, buf)?;
        encode_seq(&self.links, buf)?;
        encode_seq(&self.relationships, buf)?;
        self.status.encode(buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            meta: Metadata::decode(buf)?,
            history: decode_seq(buf)?,
            title: String::decode(buf)?,
            preamble: String::decode(buf)?,
            sections: decode_seq(buf)?,
            tags: decode_seq(buf)?,
            labels: decode_map(buf)?,
            links: decode_seq(buf)?,
            relationships: decode_seq(buf)?,
            status: Status::decode(buf)?,
        })
    }
}

record_wire!(Section, Page);
