use std::io::{ErrorKind, Read};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::error::ExtractError;
use super::scanner::ObjectScanner;

/// A decoded top-level object, before any mapping to a canonical record.
pub type RawRecord = Map<String, Value>;

/// Hard caps for one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractBudget {
    /// Maximum number of (decompressed) bytes consumed from the source.
    pub max_bytes: u64,
    /// Maximum number of records yielded.
    pub max_records: usize,
    /// Size of each read from the source.
    pub chunk_size: usize,
}

impl Default for ExtractBudget {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_records: 100,
            chunk_size: 8192,
        }
    }
}

/// Lazily pulls records out of a byte stream of concatenated objects.
///
/// The sequence ends at end of stream or when either budget is reached,
/// whichever comes first; a partially captured object is dropped. Failures
/// are yielded as a final `Err` item: `SourceUnavailable` on a read error,
/// `NoRecordsExtracted` when the stream ends without a single record.
pub struct RecordExtractor<R> {
    reader: R,
    budget: ExtractBudget,
    scanner: ObjectScanner,
    chunk: Vec<u8>,
    pos: usize,
    filled: usize,
    consumed: u64,
    yielded: usize,
    discarded: usize,
    finished: bool,
}

impl<R: Read> RecordExtractor<R> {
    pub fn new(reader: R, budget: ExtractBudget) -> Self {
        Self {
            reader,
            budget,
            scanner: ObjectScanner::new(),
            chunk: vec![0; budget.chunk_size.max(1)],
            pos: 0,
            filled: 0,
            consumed: 0,
            yielded: 0,
            discarded: 0,
            finished: false,
        }
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Records yielded so far.
    pub fn records_yielded(&self) -> usize {
        self.yielded
    }

    /// Balanced objects that failed to decode and were dropped.
    pub fn objects_discarded(&self) -> usize {
        self.discarded
    }

    fn finish(&mut self) -> Option<Result<RawRecord, ExtractError>> {
        self.finished = true;
        debug!(
            bytes = self.consumed,
            records = self.yielded,
            discarded = self.discarded,
            "Extraction finished"
        );
        if self.yielded == 0 {
            Some(Err(ExtractError::NoRecordsExtracted))
        } else {
            None
        }
    }

    /// Refills the chunk buffer. Returns false when the stream or the byte
    /// budget is exhausted.
    fn fill(&mut self) -> Result<bool, ExtractError> {
        let remaining = self.budget.max_bytes.saturating_sub(self.consumed);
        if remaining == 0 {
            return Ok(false);
        }
        let want = (self.chunk.len() as u64).min(remaining) as usize;

        loop {
            match self.reader.read(&mut self.chunk[..want]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    self.consumed += n as u64;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractError::SourceUnavailable(e)),
            }
        }
    }
}

impl<R: Read> Iterator for RecordExtractor<R> {
    type Item = Result<RawRecord, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            if self.yielded >= self.budget.max_records {
                return self.finish();
            }

            if self.pos == self.filled {
                match self.fill() {
                    Ok(true) => {}
                    Ok(false) => return self.finish(),
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }

            while self.pos < self.filled {
                let byte = self.chunk[self.pos];
                self.pos += 1;

                let Some(candidate) = self.scanner.push(byte) else {
                    continue;
                };

                match serde_json::from_slice::<RawRecord>(&candidate) {
                    Ok(record) => {
                        self.yielded += 1;
                        return Some(Ok(record));
                    }
                    Err(e) => {
                        self.discarded += 1;
                        trace!(error = %e, "Discarding undecodable object");
                    }
                }
            }
        }
    }
}
