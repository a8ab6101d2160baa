//! Thread-safe record scanner over a byte stream.
//!
//! Each `scan` serializes on the scanner's lock, advances the line buffer
//! once and reports one of three outcomes: a record, a clean end of stream,
//! or an error carrying the underlying cause.

#[cfg(feature = "async")]
mod async_scanner;
mod blocking;
mod framer;

#[cfg(feature = "async")]
pub use async_scanner::AsyncScanner;
pub use blocking::{Records, Scanner};

/// Non-error outcome of a single `scan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// One record, delimiter stripped. Contents are not validated.
    Record(Vec<u8>),
    /// The source has no more bytes to offer.
    EndOfStream,
}

impl Scan {
    /// The record bytes, or `None` at end of stream.
    pub fn into_record(self) -> Option<Vec<u8>> {
        match self {
            Self::Record(bytes) => Some(bytes),
            Self::EndOfStream => None,
        }
    }

    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
