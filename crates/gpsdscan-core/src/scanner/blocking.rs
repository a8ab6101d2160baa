//! Scanner over a blocking `std::io::Read` source.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use super::Scan;
use super::framer::{Framer, Step};
use crate::config::ScannerConfig;
use crate::error::{ConfigError, Error, Result};

/// Delimiter state bound to one source: advance, current record, last error.
struct LineBuffer<R> {
    reader: BufReader<R>,
    framer: Framer,
    err: Option<io::Error>,
}

impl<R: Read> LineBuffer<R> {
    fn new(reader: R, config: &ScannerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reader: BufReader::with_capacity(config.read_buffer_bytes, reader),
            framer: Framer::new(config),
            err: None,
        })
    }

    /// Try to complete the next record. On `false`, `take_err` tells an
    /// error apart from a clean end of stream.
    fn advance(&mut self) -> bool {
        self.err = None;
        match self.read_record() {
            Ok(ready) => ready,
            Err(e) => {
                self.err = Some(e);
                false
            }
        }
    }

    fn read_record(&mut self) -> io::Result<bool> {
        self.framer.begin();
        loop {
            let available = match self.reader.fill_buf() {
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

    fn record(&self) -> &[u8] {
        self.framer.record()
    }

    fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

/// Newline-delimited record scanner, safe to share between threads.
///
/// Calls to [`Scanner::scan`] are fully serialized, so records reach callers
/// in stream order with none duplicated or skipped. The scanner never closes
/// its source; [`Scanner::into_inner`] hands it back.
pub struct Scanner<R> {
    lines: Mutex<Option<LineBuffer<R>>>,
}

/// Uninitialized scanner with no source bound. Every `scan` on it returns
/// [`Error::NotInitialized`].
impl<R> Default for Scanner<R> {
    fn default() -> Self {
        Self {
            lines: Mutex::new(None),
        }
    }
}

impl<R> std::fmt::Debug for Scanner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<R> Scanner<R> {
    /// Whether a source is bound.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Release the source without closing it. Buffered bytes not yet
    /// returned as records are lost.
    pub fn into_inner(self) -> Option<R> {
        self.lines
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|lines| lines.reader.into_inner())
    }

    // A panic inside the source's `read` poisons the lock. The framer keeps
    // any partial record, so the next advance resumes where it stopped.
    fn lock(&self) -> MutexGuard<'_, Option<LineBuffer<R>>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Read> Scanner<R> {
    /// Bind a scanner to `reader` with default settings.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_config(reader, &ScannerConfig::default())
    }

    /// Bind a scanner to `reader`. Does not read from it.
    pub fn with_config(reader: R, config: &ScannerConfig) -> Result<Self> {
        let lines =
            LineBuffer::new(reader, config).map_err(|source| Error::Initialization { source })?;
        debug!(
            read_buffer_bytes = config.read_buffer_bytes,
            max_record_bytes = config.max_record_bytes,
            "Scanner bound to source"
        );
        Ok(Self {
            lines: Mutex::new(Some(lines)),
        })
    }

    /// Block until the next record, a clean end of stream, or an error.
    ///
    /// Concurrent callers wait for the lock. There is no retry and no
    /// terminal latch: every call advances the line buffer once more.
    pub fn scan(&self) -> Result<Scan> {
        let mut guard = self.lock();
        let Some(lines) = guard.as_mut() else {
            return Err(Error::NotInitialized);
        };

        if lines.advance() {
            let record = lines.record().to_vec();
            trace!(len = record.len(), "Scanned record");
            return Ok(Scan::Record(record));
        }

        match lines.take_err() {
            Some(source) => {
                warn!(error = %source, "Line buffer failed to advance");
                Err(Error::Advance { source })
            }
            None => {
                debug!("End of stream");
                Ok(Scan::EndOfStream)
            }
        }
    }

    /// Iterate records until end of stream. The first error is yielded
    /// once and ends the iteration.
    pub const fn records(&self) -> Records<'_, R> {
        Records {
            scanner: self,
            done: false,
        }
    }
}

/// Iterator returned by [`Scanner::records`].
#[derive(Debug)]
pub struct Records<'a, R> {
    scanner: &'a Scanner<R>,
    done: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scanner.scan() {
            Ok(Scan::Record(record)) => Some(Ok(record)),
            Ok(Scan::EndOfStream) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Records<'_, R> {}
