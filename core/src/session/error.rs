//! Errors raised by geometry session calls.

use std::fmt;

use super::PartRef;

/// Errors reported by a [`GeometrySession`](super::GeometrySession) call.
///
/// A missing attribute is not an error; queries return `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The part is not known to the session.
    InvalidPart(PartRef),
    /// The attribute exists but holds a different storage kind.
    StorageMismatch {
        name: String,
        expected: &'static str,
    },
    /// The underlying session call failed.
    Backend(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidPart(part) => write!(f, "invalid part: {part}"),
            SessionError::StorageMismatch { name, expected } => {
                write!(f, "attribute \"{name}\" is not stored as {expected}")
            }
            SessionError::Backend(msg) => write!(f, "session call failed: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}
