//! # gordon-protocol
//!
//! Wire protocol implementation for gordon.
//!
//! This crate provides:
//! - Scalar, sequence and mapping codecs over a fixed, untagged layout
//! - Single-byte enumerations with range validation
//! - Records with transform and validation hooks run on both encode and decode
//! - The document model ([`Page`] and friends) and [`Request`]
//! - Length-prefixed framing with an explicit maximum size

pub mod codec;
pub mod collection;
pub mod enums;
pub mod error;
pub mod frame;
pub mod link;
pub mod metadata;
pub mod page;
pub mod record;
pub mod request;
pub mod scalar;

pub use codec::{Decoder, Encoder};
pub use enums::{ParseVerbError, Predicate, Status, Verb};
pub use error::{FieldError, ProtocolError, ValidationErrors};
pub use frame::{Frame, FRAME_HEADER_SIZE};
pub use link::{PageRef, Relationship};
pub use metadata::Metadata;
pub use page::{Page, Section, TITLE_MAX_LEN};
pub use record::Record;
pub use request::Request;
pub use scalar::Wire;

/// Default port for a gordon server.
pub const DEFAULT_PORT: u16 = 4444;

/// Maximum frame payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum size of an encoded request (64 KiB).
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;
