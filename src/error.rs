//! The error type shared by all tree operations

use std::fmt::{self, Display, Formatter};

/// A shorthand for results with our [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// An enumerated error type for every way a tree operation can be rejected
///
/// None of these are transient: every operation is deterministic, so an error always indicates
/// that the caller passed something invalid. They're reported immediately and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An index was outside of `0..=len` for the texel it was given to
    ///
    /// Intervals with `start > end` report their end index here.
    OutOfRange { idx: usize, len: usize },

    /// The interval `start..end` crosses the edge of a [`Container`] slot
    ///
    /// [`Container`]: crate::Container
    Boundary { start: usize, end: usize },

    /// A container kind (or a texel built from one) doesn't uphold the texel protocol
    Conformance { kind: String, reason: String },

    /// The configuration couldn't be parsed, loaded, or validated
    Config(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use Error::*;

        match self {
            OutOfRange { idx, len } => write!(f, "index {} out of range for length {}", idx, len),
            Boundary { start, end } => write!(
                f,
                "interval {}..{} crosses a container slot boundary",
                start, end
            ),
            Conformance { kind, reason } => {
                write!(f, "container kind '{}' is not conforming: {}", kind, reason)
            }
            Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// (*Internal*) Checks that `idx` is a valid position for something with length `len`
    pub(crate) fn check_index(idx: usize, len: usize) -> Result<()> {
        match idx <= len {
            true => Ok(()),
            false => Err(Error::OutOfRange { idx, len }),
        }
    }

    /// (*Internal*) Checks that `start..end` is a valid interval within `0..len`
    pub(crate) fn check_interval(start: usize, end: usize, len: usize) -> Result<()> {
        Self::check_index(start, len)?;
        Self::check_index(end, len)?;
        match start <= end {
            true => Ok(()),
            false => Err(Error::OutOfRange { idx: end, len }),
        }
    }

    /// (*Internal*) Offsets the interval of a boundary error by `by`
    ///
    /// Errors from a child are relative to the child; this translates them to the parent's index
    /// space. Other errors are returned unchanged.
    pub(crate) fn shifted(self, by: usize) -> Error {
        match self {
            Error::Boundary { start, end } => Error::Boundary {
                start: start + by,
                end: end + by,
            },
            e => e,
        }
    }
}
