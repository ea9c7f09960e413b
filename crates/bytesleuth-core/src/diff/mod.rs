/// Byte diff engine — streams two inputs in lockstep and reports every
/// byte position where they differ.
///
/// Memory use is two chunk buffers regardless of file size. Each chunk is
/// filled completely unless end-of-data is reached, so both streams stay
/// aligned even when the OS returns short reads.
///
/// # Trailing bytes
///
/// Comparison stops when either stream runs out. By default the longer input
/// is not read past that point and nothing is reported for its remaining
/// bytes; the length difference is only logged and returned in
/// [`DiffOutcome::length_mismatch`].
/// With [`TrailingPolicy::Report`] each trailing byte becomes a
/// [`DamageKind::Truncated`](crate::model::DamageKind) or
/// [`DamageKind::Extended`](crate::model::DamageKind) record.
use crate::config::{AnalysisConfig, OffsetWidth, TrailingPolicy, DEFAULT_CHUNK_SIZE};
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{DamageRecord, LengthMismatch};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;
use tracing::warn;

/// The subset of [`AnalysisConfig`] the diff engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub chunk_size: usize,
    pub trailing: TrailingPolicy,
    pub offsets: OffsetWidth,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            trailing: TrailingPolicy::Ignore,
            offsets: OffsetWidth::Wide,
        }
    }
}

impl From<&AnalysisConfig> for DiffOptions {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            chunk_size: cfg.chunk_size.max(1),
            trailing: cfg.trailing,
            offsets: cfg.offsets,
        }
    }
}

/// Result of comparing one pair of inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Damage records in strictly increasing offset order.
    pub damages: Vec<DamageRecord>,
    /// Set when the inputs have different lengths. From
    /// [`compare_readers`] under `Ignore` it is only set when the longer
    /// stream ended in the same chunk; [`compare_files`] fills it from file
    /// metadata otherwise.
    pub length_mismatch: Option<LengthMismatch>,
}

/// Convert a 64-bit byte position into the configured offset width.
#[inline]
pub fn fold_offset(position: u64, width: OffsetWidth) -> i64 {
    match width {
        OffsetWidth::Wide => position as i64,
        OffsetWidth::Legacy32 => i64::from(position as i32),
    }
}

/// Which side of the comparison an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Candidate,
}

/// An I/O failure tagged with the side that produced it.
#[derive(Debug)]
pub struct SideError {
    pub side: Side,
    pub source: io::Error,
}

/// Compare two files on disk.
pub fn compare_files(
    reference: &Path,
    candidate: &Path,
    opts: &DiffOptions,
) -> AnalysisResult<DiffOutcome> {
    let ref_file = File::open(reference).map_err(|e| AnalysisError::io(reference, e))?;
    let cand_file = File::open(candidate).map_err(|e| AnalysisError::io(candidate, e))?;
    let ref_len = file_len(&ref_file, reference)?;
    let cand_len = file_len(&cand_file, candidate)?;

    let mut outcome = compare_readers(ref_file, cand_file, opts).map_err(|e| match e.side {
        Side::Reference => AnalysisError::io(reference, e.source),
        Side::Candidate => AnalysisError::io(candidate, e.source),
    })?;

    // The streams stop at the shorter input, so the longer length comes
    // from metadata when it was not read to the end.
    if outcome.length_mismatch.is_none() && ref_len != cand_len {
        let lm = LengthMismatch {
            reference_len: ref_len,
            candidate_len: cand_len,
        };
        warn_length_mismatch(lm);
        outcome.length_mismatch = Some(lm);
    }
    Ok(outcome)
}

fn file_len(file: &File, path: &Path) -> AnalysisResult<u64> {
    file.metadata()
        .map(|m| m.len())
        .map_err(|e| AnalysisError::io(path, e))
}

/// Compare two arbitrary byte streams.
pub fn compare_readers<A: Read, B: Read>(
    mut reference: A,
    mut candidate: B,
    opts: &DiffOptions,
) -> Result<DiffOutcome, SideError> {
    let chunk = opts.chunk_size.max(1);
    let mut buf_a = vec![0u8; chunk];
    let mut buf_b = vec![0u8; chunk];
    let mut damages = Vec::new();
    let mut position: u64 = 0;

    loop {
        let n_a = read_chunk(&mut reference, &mut buf_a).map_err(|source| SideError {
            side: Side::Reference,
            source,
        })?;
        let n_b = read_chunk(&mut candidate, &mut buf_b).map_err(|source| SideError {
            side: Side::Candidate,
            source,
        })?;

        let overlap = n_a.min(n_b);
        for (i, (&a, &b)) in buf_a[..overlap].iter().zip(&buf_b[..overlap]).enumerate() {
            if a != b {
                let offset = fold_offset(position + i as u64, opts.offsets);
                damages.push(DamageRecord::mismatch(offset, a, b));
            }
        }
        position += overlap as u64;

        // Full chunks on both sides: keep going.
        if n_a == chunk && n_b == chunk {
            continue;
        }

        if n_a == n_b {
            return Ok(DiffOutcome {
                damages,
                length_mismatch: None,
            });
        }

        let reference_longer = n_a > n_b;
        let (longer_n, longer_full) = if reference_longer {
            (n_a, n_a == chunk)
        } else {
            (n_b, n_b == chunk)
        };

        // One side ended inside this chunk. Under `Ignore` the comparison is
        // over; the longer stream is read further only to report its tail.
        let longer_len = if opts.trailing == TrailingPolicy::Report {
            let tail = if reference_longer {
                drain_tail(
                    &mut reference,
                    &mut buf_a,
                    overlap..n_a,
                    n_a == chunk,
                    position,
                    &mut damages,
                    |off, byte| DamageRecord::truncated(fold_offset(off, opts.offsets), byte),
                )
                .map_err(|source| SideError {
                    side: Side::Reference,
                    source,
                })?
            } else {
                drain_tail(
                    &mut candidate,
                    &mut buf_b,
                    overlap..n_b,
                    n_b == chunk,
                    position,
                    &mut damages,
                    |off, byte| DamageRecord::extended(fold_offset(off, opts.offsets), byte),
                )
                .map_err(|source| SideError {
                    side: Side::Candidate,
                    source,
                })?
            };
            Some(position + tail)
        } else if longer_full {
            None
        } else {
            Some(position + (longer_n - overlap) as u64)
        };

        let length_mismatch = longer_len.map(|longer_len| {
            let lm = if reference_longer {
                LengthMismatch {
                    reference_len: longer_len,
                    candidate_len: position,
                }
            } else {
                LengthMismatch {
                    reference_len: position,
                    candidate_len: longer_len,
                }
            };
            warn_length_mismatch(lm);
            lm
        });

        return Ok(DiffOutcome {
            damages,
            length_mismatch,
        });
    }
}

fn warn_length_mismatch(lm: LengthMismatch) {
    warn!(
        "Different file lengths detected: reference {} bytes, candidate {} bytes",
        lm.reference_len, lm.candidate_len
    );
}

/// Consume the rest of the longer stream, starting with the unconsumed part
/// of its current chunk, recording each byte in `out`. Returns the number of
/// trailing bytes.
fn drain_tail<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    pending: std::ops::Range<usize>,
    may_have_more: bool,
    start: u64,
    out: &mut Vec<DamageRecord>,
    make: impl Fn(u64, u8) -> DamageRecord,
) -> io::Result<u64> {
    let mut tail: u64 = 0;
    let mut emit = |bytes: &[u8], tail: &mut u64| {
        out.extend(
            bytes
                .iter()
                .enumerate()
                .map(|(i, &b)| make(start + *tail + i as u64, b)),
        );
        *tail += bytes.len() as u64;
    };

    emit(&buf[pending], &mut tail);

    if may_have_more {
        loop {
            let n = read_chunk(reader, buf)?;
            emit(&buf[..n], &mut tail);
            if n < buf.len() {
                break;
            }
        }
    }
    Ok(tail)
}

/// Fill `buf` from `reader`, stopping early only at end-of-data.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
