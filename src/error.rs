//! Error taxonomy for the build core.
//!
//! The builder has no local recovery: any fatal error triggers `abort()` on the
//! active back-end and is re-raised to the caller as a [`BuildError`].

use std::fmt;

/// Which hard-coded capacity was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Element name dictionary would exceed `0x8000` entries.
    Elems,
    /// Attribute name dictionary would exceed `0x8000` entries.
    Atts,
    /// Uri dictionary would exceed `0x100` entries.
    Ns,
    /// Attribute count on one element would exceed `MAX_ATTS`.
    AttsPerElem,
    /// The pre counter (`size`) would exceed `2^31 - 1`.
    Range,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Limit::Elems => "element name dictionary limit (0x8000) exceeded",
            Limit::Atts => "attribute name dictionary limit (0x8000) exceeded",
            Limit::Ns => "namespace uri dictionary limit (0x100) exceeded",
            Limit::AttsPerElem => "attribute count per element limit exceeded",
            Limit::Range => "pre counter overflow (2^31 - 1)",
        };
        f.write_str(s)
    }
}

/// Fatal error raised by the build core.
#[derive(Debug)]
pub enum BuildError {
    /// One of the hard-coded capacity limits was exceeded.
    StructuralLimit(Limit),
    /// A prefixed name had no in-scope namespace binding (other than `xml`).
    NamespaceBinding {
        /// The unresolved prefix.
        prefix: String,
        /// The pre of the node carrying the unresolved name.
        pre: u32,
    },
    /// Underlying I/O failure from the byte sink.
    Io(std::io::Error),
    /// The host-provided stop flag was observed at a `check_stop()` point.
    Cancelled,
    /// An event was delivered outside the state allowed by the front-end's
    /// state machine (a parser programming error).
    Protocol(&'static str),
    /// Forwarded verbatim from the driving parser.
    Parser(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::StructuralLimit(l) => write!(f, "{l}"),
            BuildError::NamespaceBinding { prefix, pre } => {
                write!(f, "unresolved namespace prefix '{prefix}' at pre {pre}")
            }
            BuildError::Io(e) => write!(f, "I/O error: {e}"),
            BuildError::Cancelled => f.write_str("build cancelled"),
            BuildError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            BuildError::Parser(msg) => write!(f, "parser error: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}

/// Convenience alias used throughout the build core.
pub type Result<T> = std::result::Result<T, BuildError>;
