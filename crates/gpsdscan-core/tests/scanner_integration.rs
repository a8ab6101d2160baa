#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the record scanner.
//!
//! Covers the caller-visible contract: ordering, the three outcomes, and
//! serialization of concurrent callers.

use std::collections::HashSet;
use std::io::{self, Read};

#[cfg(feature = "async")]
use gpsdscan_core::AsyncScanner;
use gpsdscan_core::{Error, Scan, Scanner};

/// `{"class":"TPV","n":0}\n{"class":"TPV","n":1}\n...`
fn tpv_stream(n: usize) -> Vec<u8> {
    (0..n)
        .flat_map(|i| format!("{{\"class\":\"TPV\",\"n\":{i}}}\n").into_bytes())
        .collect()
}

fn record_number(record: &[u8]) -> u64 {
    let doc: serde_json::Value = serde_json::from_slice(record).unwrap();
    doc["n"].as_u64().unwrap()
}

/// Hands out at most `step` bytes per read, so records straddle reads.
struct TrickleReader {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Read for TrickleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let end = (self.pos + self.step).min(self.data.len());
        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn n_records_then_end_of_stream() {
    let n = 50;
    let scanner = Scanner::new(TrickleReader {
        data: tpv_stream(n),
        pos: 0,
        step: 7,
    })
    .unwrap();

    for expected in 0..n as u64 {
        let record = scanner.scan().unwrap().into_record().unwrap();
        assert_eq!(record_number(&record), expected);
    }
    assert_eq!(scanner.scan().unwrap(), Scan::EndOfStream);
    assert_eq!(scanner.scan().unwrap(), Scan::EndOfStream);
}

#[test]
fn records_are_not_validated_as_json() {
    let scanner = Scanner::new(&b"not json\n{\"class\":\"SKY\"}\n"[..]).unwrap();
    let records: Vec<_> = scanner.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(records, vec![b"not json".to_vec(), br#"{"class":"SKY"}"#.to_vec()]);
}

#[test]
fn uninitialized_scanner_never_yields_a_record() {
    let scanner: Scanner<&[u8]> = Scanner::default();
    for _ in 0..3 {
        assert!(matches!(scanner.scan(), Err(Error::NotInitialized)));
    }
    assert_eq!(scanner.records().count(), 1);
}

#[test]
fn concurrent_threads_partition_the_stream() {
    let n = 2_000;
    let scanner = Scanner::new(TrickleReader {
        data: tpv_stream(n),
        pos: 0,
        step: 61,
    })
    .unwrap();

    let per_thread: Vec<Vec<u64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let mut seen = Vec::new();
                    while let Scan::Record(record) = scanner.scan().unwrap() {
                        seen.push(record_number(&record));
                    }
                    seen
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Each caller sees an increasing subsequence of the stream.
    for seen in &per_thread {
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    // Together they see every record exactly once.
    let total: usize = per_thread.iter().map(Vec::len).sum();
    let unique: HashSet<u64> = per_thread.into_iter().flatten().collect();
    assert_eq!(total, n);
    assert_eq!(unique.len(), n);
}

#[cfg(feature = "async")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_tasks_partition_the_stream() {
    let n = 500;
    let source = std::io::Cursor::new(tpv_stream(n));
    let scanner = std::sync::Arc::new(AsyncScanner::new(source).unwrap());

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let scanner = std::sync::Arc::clone(&scanner);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Scan::Record(record) = scanner.scan().await.unwrap() {
                    seen.push(record_number(&record));
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::new();
    for task in tasks {
        let seen = task.await.unwrap();
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        all.extend(seen);
    }
    all.sort_unstable();
    assert_eq!(all, (0..n as u64).collect::<Vec<_>>());
}

#[cfg(feature = "async")]
#[tokio::test]
async fn async_scanner_reads_from_a_pipe() {
    let (mut tx, rx) = tokio::io::duplex(16);
    let scanner = AsyncScanner::new(rx).unwrap();

    let writer = tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        tx.write_all(b"{\"class\":\"VERSION\"}\r\n").await.unwrap();
        tx.write_all(b"{\"class\":\"DEVICES\"}\r\n").await.unwrap();
        // Dropping the writer closes the pipe.
    });

    assert_eq!(
        scanner.scan().await.unwrap(),
        Scan::Record(br#"{"class":"VERSION"}"#.to_vec())
    );
    assert_eq!(
        scanner.scan().await.unwrap(),
        Scan::Record(br#"{"class":"DEVICES"}"#.to_vec())
    );
    writer.await.unwrap();
    assert_eq!(scanner.scan().await.unwrap(), Scan::EndOfStream);
}

#[cfg(feature = "async")]
#[tokio::test]
async fn cancelled_scan_resumes_the_same_record() {
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    let (mut tx, rx) = tokio::io::duplex(64);
    let scanner = AsyncScanner::new(rx).unwrap();

    tx.write_all(b"{\"class\":").await.unwrap();
    let timed_out = tokio::time::timeout(Duration::from_millis(50), scanner.scan()).await;
    assert!(timed_out.is_err());

    tx.write_all(b"\"TPV\"}\n{\"class\":\"SKY\"}\n").await.unwrap();
    drop(tx);

    assert_eq!(
        scanner.scan().await.unwrap(),
        Scan::Record(br#"{"class":"TPV"}"#.to_vec())
    );
    assert_eq!(
        scanner.scan().await.unwrap(),
        Scan::Record(br#"{"class":"SKY"}"#.to_vec())
    );
    assert_eq!(scanner.scan().await.unwrap(), Scan::EndOfStream);
}
