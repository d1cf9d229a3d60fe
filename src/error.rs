//! Error management module

use std::fmt;

/// The error type used by this crate.
///
/// Mirrors the three error kinds the canonicalization core distinguishes:
/// a malformed call (bad input shape), a broken internal invariant (a
/// prefix with no enclosing declaration), and a malformed XPath expression
/// found inside a qname-aware-XPath element's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller supplied a null root, a mismatched include/exclude list,
    /// or a node whose prefix has no enclosing declaration.
    InputShape(String),
    /// A prefix resolves to no URI at a point where one must exist.
    InternalInvariant {
        /// The prefix that could not be resolved.
        prefix: String,
    },
    /// The XPath reparser encountered an unterminated string literal.
    BadXpath {
        /// Character index, from the start of the expression, where the
        /// scan ran out of input while still inside a quoted string.
        position: usize,
    },
}

/// Result type
pub type Result<T> = ::std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InputShape(msg) => write!(f, "invalid input shape: {}", msg),
            Error::InternalInvariant { prefix } => write!(
                f,
                "prefix {:?} has no enclosing namespace declaration",
                prefix
            ),
            Error::BadXpath { position } => {
                write!(f, "unterminated string literal in XPath expression at position {}", position)
            }
        }
    }
}

impl std::error::Error for Error {}
