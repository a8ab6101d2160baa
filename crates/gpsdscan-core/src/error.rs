//! Error types for `gpsdscan` core library.

use std::io;

use thiserror::Error;

/// Result type alias using `gpsdscan` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `gpsdscan` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The scanner was built with `Default` instead of a constructor and has
    /// no source bound.
    #[error("Scanner is not initialized (no source bound)")]
    NotInitialized,

    /// The line buffer could not be set up for the given stream.
    #[error("Failed to initialize line buffer: {source}")]
    Initialization {
        #[source]
        source: ConfigError,
    },

    /// The line buffer hit an I/O or framing failure while seeking the next
    /// record.
    #[error("Failed to advance to next record: {source}")]
    Advance {
        #[source]
        source: io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True when a `scan` failed because the record exceeded the configured
    /// size limit. The scanner stays usable after this error.
    pub fn is_record_too_long(&self) -> bool {
        match self {
            Self::Advance { source } => source
                .get_ref()
                .is_some_and(|inner| inner.is::<RecordTooLong>()),
            _ => false,
        }
    }
}

/// Invalid scanner settings, rejected when a scanner is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("read_buffer_bytes must be greater than zero")]
    ZeroReadBuffer,

    #[error("max_record_bytes must be greater than zero")]
    ZeroRecordLimit,
}

/// A record grew past `max_record_bytes` before its delimiter was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record exceeds {limit} bytes")]
pub struct RecordTooLong {
    pub limit: usize,
}

impl From<RecordTooLong> for io::Error {
    fn from(err: RecordTooLong) -> Self {
        Self::new(io::ErrorKind::InvalidData, err)
    }
}
