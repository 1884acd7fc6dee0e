//! Client requests.

use crate::collection::{decode_map, encode_map};
use crate::enums::Verb;
use crate::error::{ProtocolError, ValidationErrors};
use crate::record::{record_wire, Record};
use crate::scalar::Wire;
use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A request for one document.
///
/// Wire layout: `verb (1) | id (16) | args{}`.
///
/// The nil id does not name a document; a `Read` of it asks for the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    pub verb: Verb,
    pub id: Uuid,
    pub args: BTreeMap<String, String>,
}

impl Request {
    pub fn new(verb: Verb, id: Uuid) -> Self {
        Self {
            verb,
            id,
            args: BTreeMap::new(),
        }
    }

    /// Reads the document with the given id.
    pub fn read(id: Uuid) -> Self {
        Self::new(Verb::Read, id)
    }

    /// Reads the index of every document on the server.
    pub fn index() -> Self {
        Self::read(Uuid::nil())
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn is_index(&self) -> bool {
        self.id.is_nil()
    }
}

impl Record for Request {
    const NAME: &'static str = "Request";

    fn check(&self, errors: &mut ValidationErrors) {
        if !self.verb.is_valid() {
            errors.push("Verb", "must be a known value");
        }
    }

    fn write_fields(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        self.verb.encode(buf)?;
        self.id.encode(buf)?;
        encode_map(&self.args, buf)
    }

    fn read_fields<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
        Ok(Self {
            verb: Verb::decode(buf)?,
            id: Uuid::decode(buf)?,
            args: decode_map(buf)?,
        })
    }
}

record_wire!(Request);
