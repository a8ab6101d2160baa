//! `gpsdscan` Core Library
//!
//! Scans an open byte stream and yields one newline-delimited record per
//! call (by convention a single gpsd JSON document):
//! - [`Scanner`] for blocking readers, safe to share between threads
//! - [`AsyncScanner`] for tokio readers (feature `async`)
//! - Configuration resolution and tracing setup for the binaries
//! - Common error types
//!
//! The scanner only delimits records. Interpreting the JSON payload is left
//! to the caller.

pub mod config;
pub mod error;
pub mod scanner;
pub mod tracing_init;

pub use config::{Config, LogConfig, ScannerConfig};
pub use error::{ConfigError, Error, RecordTooLong, Result};
#[cfg(feature = "async")]
pub use scanner::AsyncScanner;
pub use scanner::{Records, Scan, Scanner};
