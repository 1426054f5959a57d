//! Error type for the frame-level API.

use core::fmt;
use std::error::Error as StdError;

use sordina_lec::CreateError;

/// Errors surfaced by [`LineEchoProcessor`](crate::LineEchoProcessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The configured filter length was zero.
    InvalidTaps,
    /// The far, near, and output frames passed to `process_frame` did not
    /// all have the same length.
    FrameSizeMismatch {
        /// Far-end frame length.
        far: usize,
        /// Near-end frame length.
        near: usize,
        /// Output frame length.
        out: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTaps => write!(f, "filter length must be non-zero"),
            Self::FrameSizeMismatch { far, near, out } => write!(
                f,
                "frame lengths must match (far: {far}, near: {near}, out: {out})"
            ),
        }
    }
}

impl StdError for Error {}

impl From<CreateError> for Error {
    fn from(err: CreateError) -> Self {
        match err {
            CreateError::ZeroTaps => Self::InvalidTaps,
        }
    }
}
