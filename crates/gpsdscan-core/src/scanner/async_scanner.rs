//! Scanner over a tokio `AsyncRead` source.
//!
//! Same contract as [`Scanner`](super::Scanner), but callers waiting for the
//! lock or for bytes are suspended instead of blocking a thread.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::Scan;
use super::framer::{Framer, Step};
use crate::config::ScannerConfig;
use crate::error::{ConfigError, Error, Result};

struct AsyncLineBuffer<R> {
    reader: BufReader<R>,
    framer: Framer,
}

impl<R: AsyncRead + Unpin> AsyncLineBuffer<R> {
    fn new(reader: R, config: &ScannerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reader: BufReader::with_capacity(config.read_buffer_bytes, reader),
            framer: Framer::new(config),
        })
    }

    /// `Ok(true)` when a record is ready, `Ok(false)` at a clean end.
    async fn advance(&mut self) -> io::Result<bool> {
        self.framer.begin();
        loop {
            let available = match self.reader.fill_buf().await {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(self.framer.finish());
            }
            let (consumed, step) = self.framer.feed(available);
            self.reader.consume(consumed);
            match step {
                Step::Pending => {}
                Step::Complete => return Ok(true),
                Step::Overflow(too_long) => return Err(too_long.into()),
            }
        }
    }
}

/// Newline-delimited record scanner for async sources.
pub struct AsyncScanner<R> {
    lines: Mutex<Option<AsyncLineBuffer<R>>>,
}

impl<R> Default for AsyncScanner<R> {
    fn default() -> Self {
        Self {
            lines: Mutex::new(None),
        }
    }
}

impl<R> std::fmt::Debug for AsyncScanner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `None` while a `scan` holds the lock.
        let initialized = self.lines.try_lock().ok().map(|lines| lines.is_some());
        f.debug_struct("AsyncScanner")
            .field("initialized", &initialized)
            .finish_non_exhaustive()
    }
}

impl<R> AsyncScanner<R> {
    /// Whether a source is bound. Waits for an in-flight `scan` to finish.
    pub async fn is_initialized(&self) -> bool {
        self.lines.lock().await.is_some()
    }
}

impl<R: AsyncRead + Unpin> AsyncScanner<R> {
    /// Bind a scanner to `reader` with default settings.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_config(reader, &ScannerConfig::default())
    }

    /// Bind a scanner to `reader`. Does not read from it.
    pub fn with_config(reader: R, config: &ScannerConfig) -> Result<Self> {
        let lines = AsyncLineBuffer::new(reader, config)
            .map_err(|source| Error::Initialization { source })?;
        debug!(
            read_buffer_bytes = config.read_buffer_bytes,
            max_record_bytes = config.max_record_bytes,
            "Async scanner bound to source"
        );
        Ok(Self {
            lines: Mutex::new(Some(lines)),
        })
    }

    /// Release the source without closing it. Buffered bytes not yet
    /// returned as records are lost.
    pub fn into_inner(self) -> Option<R> {
        self.lines
            .into_inner()
            .map(|lines| lines.reader.into_inner())
    }

    /// Wait for the next record, a clean end of stream, or an error.
    ///
    /// Cancel safe: dropping the future mid-record keeps the bytes read so
    /// far, and the next call completes that same record.
    pub async fn scan(&self) -> Result<Scan> {
        let mut guard = self.lines.lock().await;
        let Some(lines) = guard.as_mut() else {
            return Err(Error::NotInitialized);
        };

        match lines.advance().await {
            Ok(true) => {
                let record = lines.framer.record().to_vec();
                trace!(len = record.len(), "Scanned record");
                Ok(Scan::Record(record))
            }
            Ok(false) => {
                debug!("End of stream");
                Ok(Scan::EndOfStream)
            }
            Err(source) => {
                warn!(error = %source, "Line buffer failed to advance");
                Err(Error::Advance { source })
            }
        }
    }
}
