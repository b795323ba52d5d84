//! C4: the streaming Detection Engine. Drives one reader through every
//! configured detector a chunk at a time, retaining enough of each chunk's
//! tail that a secret straddling the boundary is still matched, and
//! deduplicating the handful of matches the overlap makes visible twice.

use std::collections::HashSet;
use std::io::Read;

use thiserror::Error;
use tracing::{instrument, trace, warn};

use crate::cancel::CancellationToken;
use crate::secret::{Secret, SecretKind};

use super::Detector;

/// Chunk size below which retention can't be guaranteed to fit.
pub const MIN_READ_LEN: usize = 1024;

pub const DEFAULT_READ_LEN: usize = 1024 * 1024;
pub const DEFAULT_RETAIN_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no detectors configured")]
    NoDetectors,

    #[error("read_len must be at least {MIN_READ_LEN} bytes, got {0}")]
    ReadLenTooSmall(usize),

    #[error(
        "detector {index} reports max_secret_len {max_secret_len} larger than retain_len {retain_len}; a secret spanning a chunk boundary could be missed"
    )]
    RetainTooSmall {
        index: usize,
        max_secret_len: usize,
        retain_len: usize,
    },

    #[error("detection cancelled")]
    Cancelled,

    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// One emitted secret, tagged with the absolute byte offset (from the start
/// of the whole stream, not the current chunk) it was found at.
pub struct Emission {
    pub secret: Box<dyn Secret>,
    pub absolute_start: usize,
}

/// A single non-restartable pass over `R`. Construct with [`DetectionEngine::new`],
/// then drain it with [`DetectionEngine::run`] or by iterating chunk-by-chunk
/// via [`DetectionEngine::next_chunk`].
///
/// Re-scanning the same source requires a fresh engine over a fresh reader:
/// this mirrors the one-shot, forward-only nature of the underlying `Read`.
pub struct DetectionEngine<R> {
    reader: R,
    detectors: Vec<Box<dyn Detector>>,
    read_len: usize,
    retain_len: usize,
    buf: Vec<u8>,
    filled: usize,
    abs_offset: usize,
    seen: HashSet<(SecretKind, usize, Vec<u8>)>,
    eof: bool,
}

impl<R: Read> DetectionEngine<R> {
    pub fn new(
        reader: R,
        detectors: Vec<Box<dyn Detector>>,
        read_len: usize,
        retain_len: usize,
    ) -> Result<Self, EngineError> {
        if detectors.is_empty() {
            return Err(EngineError::NoDetectors);
        }
        if read_len < MIN_READ_LEN {
            return Err(EngineError::ReadLenTooSmall(read_len));
        }
        for (index, detector) in detectors.iter().enumerate() {
            let max_secret_len = detector.max_secret_len();
            if max_secret_len > retain_len {
                return Err(EngineError::RetainTooSmall {
                    index,
                    max_secret_len,
                    retain_len,
                });
            }
        }

        let buf = vec![0u8; read_len + retain_len];
        Ok(Self {
            reader,
            detectors,
            read_len,
            retain_len,
            buf,
            filled: 0,
            abs_offset: 0,
            seen: HashSet::new(),
            eof: false,
        })
    }

    pub fn with_defaults(
        reader: R,
        detectors: Vec<Box<dyn Detector>>,
    ) -> Result<Self, EngineError> {
        Self::new(reader, detectors, DEFAULT_READ_LEN, DEFAULT_RETAIN_LEN)
    }

    /// Drain the whole stream, collecting every emission in chunk order.
    ///
    /// Within a chunk, emissions follow detector order then detector-internal
    /// order; across chunks they follow chunk order. No global ordering by
    /// absolute position is promised — treat the result as a multiset.
    #[instrument(skip_all, fields(read_len = self.read_len, retain_len = self.retain_len))]
    pub fn run(mut self, cancel: &CancellationToken) -> Result<Vec<Emission>, EngineError> {
        let mut out = Vec::new();
        while let Some(mut chunk) = self.next_chunk(cancel)? {
            out.append(&mut chunk);
        }
        Ok(out)
    }

    /// Advance the engine by one chunk, returning its emissions, or `None`
    /// once the stream is fully drained.
    pub fn next_chunk(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Emission>>, EngineError> {
        if self.eof && self.filled == 0 {
            return Ok(None);
        }
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        if !self.eof {
            let read = self.fill_from_reader()?;
            if read == 0 {
                self.eof = true;
            }
        }

        if self.filled == 0 {
            return Ok(None);
        }

        let mut emissions = Vec::new();
        let data = &self.buf[..self.filled];
        for detector in &self.detectors {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            for (secret, local) in detector.detect(data) {
                let absolute_start = self.abs_offset + local;
                let key = (secret.kind(), absolute_start, data_slice_for(secret.as_ref(), data, local));
                if !self.seen.insert(key) {
                    trace!(absolute_start, "dropping duplicate boundary emission");
                    continue;
                }
                emissions.push(Emission {
                    secret,
                    absolute_start,
                });
            }
        }

        if self.eof {
            self.filled = 0;
        } else {
            self.shift_retain_tail();
            self.prune_dedup_window();
        }

        Ok(Some(emissions))
    }

    fn fill_from_reader(&mut self) -> Result<usize, std::io::Error> {
        let start = self.filled;
        let end = (start + self.read_len).min(self.buf.len());
        let mut total_read = 0;
        // read_exact-style loop: Read::read may return short reads.
        while self.filled < end {
            let n = self.reader.read(&mut self.buf[self.filled..end])?;
            if n == 0 {
                break;
            }
            self.filled += n;
            total_read += n;
        }
        Ok(total_read)
    }

    fn shift_retain_tail(&mut self) {
        if self.filled <= self.retain_len {
            self.abs_offset += 0;
            return;
        }
        let tail_start = self.filled - self.retain_len;
        self.buf.copy_within(tail_start..self.filled, 0);
        self.abs_offset += tail_start;
        self.filled = self.retain_len;
    }

    /// Keep only dedup entries whose absolute start is still inside the
    /// retained window, bounding memory to O(retain_len) regardless of
    /// stream length.
    fn prune_dedup_window(&mut self) {
        let floor = self.abs_offset.saturating_sub(self.retain_len);
        self.seen.retain(|(_, absolute_start, _)| *absolute_start >= floor);
    }
}

fn data_slice_for(secret: &dyn Secret, data: &[u8], local: usize) -> Vec<u8> {
    // The dedup key's byte component only needs to distinguish genuinely
    // different matches at the same (kind, position); the secret's own
    // Debug rendering combined with its start is sufficient and avoids
    // detectors having to expose raw match bytes through the trait object.
    let end = (local + 64).min(data.len());
    let mut bytes = data[local..end].to_vec();
    bytes.extend_from_slice(format!("{secret:?}").as_bytes());
    bytes
}

impl<R> std::fmt::Debug for DetectionEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionEngine")
            .field("read_len", &self.read_len)
            .field("retain_len", &self.retain_len)
            .field("abs_offset", &self.abs_offset)
            .field("eof", &self.eof)
            .finish()
    }
}

/// Logged once per file by CLI-level callers when an engine is abandoned
/// mid-stream due to cancellation; kept here so the engine and its callers
/// agree on phrasing.
pub fn log_cancelled(path: &str) {
    warn!(path, "detection cancelled before end of stream");
}
