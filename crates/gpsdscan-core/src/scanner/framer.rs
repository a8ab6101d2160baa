//! Record framing over buffered bytes, shared by the blocking and async
//! line buffers.

use crate::config::ScannerConfig;
use crate::error::RecordTooLong;

const DELIMITER: u8 = b'\n';

/// What a call to [`Framer::feed`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Bytes were taken but the record needs more input.
    Pending,
    /// The delimiter was found; the record is ready.
    Complete,
    /// The record outgrew the limit and was dropped.
    Overflow(RecordTooLong),
}

/// Accumulates one record at a time out of whatever the reader has buffered.
#[derive(Debug)]
pub(crate) struct Framer {
    record: Vec<u8>,
    max_record_bytes: usize,
    strip_carriage_return: bool,
    // Set while skipping the tail of an oversized line.
    discarding: bool,
    // Set once `record` holds a finished record. Until then a new advance
    // keeps the partial bytes, so an interrupted read resumes mid-line.
    ready: bool,
}

impl Framer {
    pub(crate) const fn new(config: &ScannerConfig) -> Self {
        Self {
            record: Vec::new(),
            max_record_bytes: config.max_record_bytes,
            strip_carriage_return: config.strip_carriage_return,
            discarding: false,
            ready: false,
        }
    }

    /// Start a new record, unless an earlier advance stopped partway
    /// through one.
    pub(crate) fn begin(&mut self) {
        if self.ready {
            self.record.clear();
            self.ready = false;
        }
    }

    /// Take bytes from `available`. Returns how many were consumed and
    /// whether the record is now complete.
    pub(crate) fn feed(&mut self, available: &[u8]) -> (usize, Step) {
        let newline = available.iter().position(|&b| b == DELIMITER);

        if self.discarding {
            return match newline {
                Some(i) => {
                    self.discarding = false;
                    (i + 1, Step::Pending)
                }
                None => (available.len(), Step::Pending),
            };
        }

        let (chunk, consumed) = match newline {
            Some(i) => (&available[..i], i + 1),
            None => (available, available.len()),
        };

        // A trailing `\r` is not counted: it is stripped if the delimiter
        // follows, and counted by the next feed otherwise.
        let last = chunk.last().or_else(|| self.record.last()).copied();
        let mut len = self.record.len() + chunk.len();
        if self.strip_carriage_return && last == Some(b'\r') {
            len -= 1;
        }
        if len > self.max_record_bytes {
            self.record.clear();
            self.discarding = newline.is_none();
            let err = RecordTooLong {
                limit: self.max_record_bytes,
            };
            return (consumed, Step::Overflow(err));
        }

        self.record.extend_from_slice(chunk);
        if newline.is_some() {
            self.trim();
            self.ready = true;
            (consumed, Step::Complete)
        } else {
            (consumed, Step::Pending)
        }
    }

    /// The source hit end of stream. Returns true when an unterminated
    /// record is left over.
    pub(crate) fn finish(&mut self) -> bool {
        self.discarding = false;
        if self.record.is_empty() {
            return false;
        }
        self.trim();
        self.ready = true;
        true
    }

    pub(crate) fn record(&self) -> &[u8] {
        &self.record
    }

    fn trim(&mut self) {
        if self.strip_carriage_return && self.record.last() == Some(&b'\r') {
            self.record.pop();
        }
    }
}
