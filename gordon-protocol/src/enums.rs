//! Single-byte enumerations: [`Verb`], [`Status`] and [`Predicate`].
//!
//! Every enumeration reserves `0` as `Unknown`. It is the in-memory default
//! for an unset value and is never legal on the wire: encoding it, or decoding
//! a byte outside the named range, fails with [`ProtocolError::InvalidEnum`].

use crate::error::ProtocolError;
use crate::scalar::Wire;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        $vis enum $name {
            /// Unset. Never valid on the wire.
            #[default]
            Unknown = 0,
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            /// Every value that may appear on the wire.
            pub const VALID: &'static [$name] = &[$($name::$variant),+];

            /// Returns the wire byte.
            pub fn as_u8(self) -> u8 {
                self as u8
            }

            /// Returns whether this value may be encoded.
            pub fn is_valid(self) -> bool {
                self != $name::Unknown
            }

            /// Maps a wire byte to a value, rejecting 0 and unassigned bytes.
            pub fn from_wire(value: u8) -> Result<Self, ProtocolError> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(ProtocolError::InvalidEnum {
                        type_name: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ProtocolError;

            fn try_from(value: u8) -> Result<Self, ProtocolError> {
                $name::from_wire(value)
            }
        }

        impl Wire for $name {
            fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
                if !self.is_valid() {
                    return Err(ProtocolError::InvalidEnum {
                        type_name: stringify!($name),
                        value: self.as_u8(),
                    });
                }
                buf.put_u8(self.as_u8());
                Ok(())
            }

            fn decode<B: Buf>(buf: &mut B) -> Result<Self, ProtocolError> {
                $name::from_wire(u8::decode(buf)?)
            }
        }
    };
}

wire_enum! {
    /// The operation a request asks the server to perform.
    pub enum Verb {
        Create = 1,
        Read = 2,
        Update = 3,
        Delete = 4,
    }
}

wire_enum! {
    /// Whether a page is ordinary content or describes an error.
    pub enum Status {
        #[serde(rename = "OK")]
        Ok = 1,
        Error = 2,
    }
}

wire_enum! {
    /// The relation a [`Relationship`](crate::Relationship) asserts between
    /// its subject and object.
    pub enum Predicate {
        HasChild = 1,
        Extends = 2,
        Supercedes = 3,
        Supplements = 4,
    }
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a verb name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown or invalid verb: {0}")]
pub struct ParseVerbError(pub String);

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Verb::Create),
            "read" => Ok(Verb::Read),
            "update" => Ok(Verb::Update),
            "delete" => Ok(Verb::Delete),
            _ => Err(ParseVerbError(s.to_string())),
        }
    }
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Error => write!(f, "ERROR"),
            Status::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::HasChild => write!(f, "has child"),
            Predicate::Extends => write!(f, "extends"),
            Predicate::Supercedes => write!(f, "supercedes"),
            Predicate::Supplements => write!(f, "supplements"),
            Predicate::Unknown => write!(f, "unknown"),
        }
    }
}
