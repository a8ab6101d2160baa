//! gpsdscan CLI
//!
//! Copies records from a scanner to a writer, one per line.

use gpsdscan_core::{AsyncScanner, Result, Scan};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Options for [`pipe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeOptions {
    /// Drop records that are not valid JSON.
    pub validate: bool,
}

/// Counters reported when the input is drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub records: u64,
    pub invalid: u64,
    pub oversized: u64,
}

/// Drain `scanner` into `out`, writing each record followed by `\n`.
///
/// Oversized records and (with `validate`) non-JSON records are logged and
/// skipped. Any other scan error stops the copy.
pub async fn pipe<R, W>(
    scanner: &AsyncScanner<R>,
    out: &mut W,
    options: PipeOptions,
) -> Result<Summary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = Summary::default();
    loop {
        match scanner.scan().await {
            Ok(Scan::Record(record)) => {
                if options.validate {
                    if let Err(e) = serde_json::from_slice::<serde_json::Value>(&record) {
                        warn!(error = %e, len = record.len(), "Dropping record that is not JSON");
                        summary.invalid += 1;
                        continue;
                    }
                }
                out.write_all(&record).await?;
                out.write_all(b"\n").await?;
                summary.records += 1;
            }
            Ok(Scan::EndOfStream) => break,
            Err(e) if e.is_record_too_long() => {
                warn!(error = %e, "Skipping oversized record");
                summary.oversized += 1;
            }
            Err(e) => return Err(e),
        }
    }
    out.flush().await?;
    debug!(?summary, "Input drained");
    Ok(summary)
}
