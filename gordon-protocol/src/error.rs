//! Protocol error types and validation errors.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while encoding or decoding wire values.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected end of stream: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("invalid boolean value: {0:#x}")]
    InvalidBool(u8),

    #[error("invalid value for type {type_name}: {value}")]
    InvalidEnum { type_name: &'static str, value: u8 },

    #[error("invalid timestamp: {secs}s + {nanos}ns")]
    InvalidTimestamp { secs: i64, nanos: u32 },

    #[error("length {0} does not fit in a u32 length prefix")]
    LengthOverflow(usize),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("{0} unread bytes after record")]
    TrailingBytes(usize),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl ProtocolError {
    /// Returns whether this error came from a record's validation rules rather
    /// than from malformed bytes.
    pub fn is_validation(&self) -> bool {
        matches!(self, ProtocolError::Validation(_))
    }
}

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Every rule a record violated, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub record: &'static str,
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            errors: Vec::new(),
        }
    }

    /// Records a violation.
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns whether a rule on `field` was violated.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Converts into a `Result`, `Ok` when nothing was violated.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed: ", self.record)?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
