//! Reed-Solomon coder: encode, verify and repair shard sets
//!
//! ## Overview
//!
//! A [`Coder`] is built once for a `(data, parity)` geometry and is immutable
//! afterwards, so it can be shared freely across threads. It holds the
//! systematic `(D+P) x D` coding matrix: a Vandermonde matrix multiplied by
//! the inverse of its own top square, which leaves the top `D x D` block as
//! the identity. Data shards therefore pass through encoding verbatim, and
//! any `D` of the `D+P` shards select an invertible `D x D` sub-matrix, which
//! is what makes every loss pattern of up to `P` shards recoverable.
//!
//! ## Parallelism
//!
//! All three operations walk the `[offset, offset + length)` window in fixed
//! 4096-byte chunks. Full chunks fan out on the shared global rayon pool;
//! the trailing remainder runs on the calling thread. Chunks never overlap,
//! each output shard is written by exactly one task per chunk, and the
//! kernel invocation order within a chunk (one `multiply`, then
//! `multiply_xor` per remaining input) is fixed.

use crate::galois::Gf8;
use crate::kernel;
use crate::matrix::{Matrix, MatrixError};
use log::debug;
use rayon::prelude::*;
use smallvec::SmallVec;
use thiserror::Error;

/// Bytes of each parallel work unit. A multiple of 16 that keeps one input
/// chunk and one output chunk comfortably inside L1.
const CHUNK_SIZE: usize = 4096;

/// Most geometries in practice stay at or below this many shards, so the
/// per-call bookkeeping lists avoid heap allocation for them.
const TYPICAL_SHARDS: usize = 32;

/// Errors from coder construction and the coding operations
#[derive(Debug, Error)]
pub enum CoderError {
    /// Shard-count bounds violated, or the shard array/buffer geometry does
    /// not match the coder
    #[error("invalid shard geometry: {0}")]
    InvalidShape(String),

    /// Too few shards survive for reconstruction
    #[error("unrecoverable loss: {present} shards present, {required} required")]
    UnrecoverableLoss { present: usize, required: usize },

    /// Matrix failure surfaced unchanged; `Singular` here means a broken
    /// coding matrix, which legal inputs cannot produce
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Read-only shard base pointer that may cross into rayon worker tasks.
///
/// SAFETY: the pointer comes from a caller-provided shard borrow that
/// outlives the coding call, and tasks only read from window ranges the
/// caller has guaranteed to be in bounds.
#[derive(Clone, Copy)]
struct ShardInput(*const u8);

unsafe impl Send for ShardInput {}
unsafe impl Sync for ShardInput {}

impl ShardInput {
    fn new(shard: &[u8]) -> Self {
        Self(shard.as_ptr())
    }

    /// # Safety
    /// `[start, start + len)` must be in bounds of the underlying shard.
    #[inline]
    unsafe fn slice(&self, start: usize, len: usize) -> &[u8] {
        std::slice::from_raw_parts(self.0.add(start), len)
    }
}

/// Writable shard base pointer that may cross into rayon worker tasks.
///
/// SAFETY: the pointer comes from a distinct `&mut [u8]` borrow, so no two
/// `ShardOutput`s alias and no `ShardOutput` aliases a `ShardInput` used in
/// the same pass. Chunk ranges are disjoint, and each (output, chunk) pair
/// is claimed by exactly one task.
#[derive(Clone, Copy)]
struct ShardOutput(*mut u8);

unsafe impl Send for ShardOutput {}
unsafe impl Sync for ShardOutput {}

impl ShardOutput {
    fn new(shard: &mut [u8]) -> Self {
        Self(shard.as_mut_ptr())
    }

    /// # Safety
    /// `[start, start + len)` must be in bounds of the underlying shard, and
    /// no other live reference may cover the same range.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn slice_mut(&self, start: usize, len: usize) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.0.add(start), len)
    }
}

/// Systematic Reed-Solomon encoder/decoder over GF(2^8).
pub struct Coder {
    data_shards: usize,
    parity_shards: usize,
    total_shards: usize,
    matrix: Matrix,
    /// Copies of the matrix rows below the identity block, as raw
    /// coefficient bytes ready for the kernel.
    parity_rows: Vec<Box<[u8]>>,
}

impl Coder {
    /// Build a coder for `data_shards` data shards and `parity_shards`
    /// parity shards. The total may not exceed 255, the number of distinct
    /// non-degenerate rows a GF(2^8) Vandermonde construction can supply.
    pub fn new(data_shards: u8, parity_shards: u8) -> Result<Self, CoderError> {
        if data_shards == 0 {
            return Err(CoderError::InvalidShape(
                "at least one data shard is required".into(),
            ));
        }
        let data_shards = data_shards as usize;
        let parity_shards = parity_shards as usize;
        let total_shards = data_shards + parity_shards;
        if total_shards > 255 {
            return Err(CoderError::InvalidShape(format!(
                "{} total shards exceed the GF(2^8) limit of 255",
                total_shards
            )));
        }

        let matrix = build_coding_matrix(data_shards, total_shards)?;
        let mut parity_rows = Vec::with_capacity(parity_shards);
        for r in data_shards..total_shards {
            parity_rows.push(Box::<[u8]>::from(matrix.row_bytes(r)?));
        }

        Ok(Self {
            data_shards,
            parity_shards,
            total_shards,
            matrix,
            parity_rows,
        })
    }

    pub fn data_shard_count(&self) -> usize {
        self.data_shards
    }

    pub fn parity_shard_count(&self) -> usize {
        self.parity_shards
    }

    pub fn total_shard_count(&self) -> usize {
        self.total_shards
    }

    /// Compute all parity shards from the data shards over the window
    /// `[offset, offset + length)`.
    ///
    /// `shards[0..D]` are read, `shards[D..D+P]` are overwritten within the
    /// window. Every shard must hold at least `offset + length` bytes.
    pub fn encode_parity(
        &self,
        shards: &mut [&mut [u8]],
        offset: usize,
        length: usize,
    ) -> Result<(), CoderError> {
        self.check_geometry(shards.len(), shards.iter().map(|s| s.len()), offset, length)?;

        let (data, parity) = shards.split_at_mut(self.data_shards);
        let inputs: SmallVec<[ShardInput; TYPICAL_SHARDS]> =
            data.iter().map(|s| ShardInput::new(s)).collect();
        let outputs: SmallVec<[ShardOutput; TYPICAL_SHARDS]> =
            parity.iter_mut().map(|s| ShardOutput::new(s)).collect();
        let rows: SmallVec<[&[u8]; TYPICAL_SHARDS]> =
            self.parity_rows.iter().map(|r| &r[..]).collect();

        code_some_shards(&rows, &inputs, &outputs, offset, length);
        Ok(())
    }

    /// Check that the parity shards match the data shards over the window.
    ///
    /// Returns `false` on any mismatch; corruption is the condition this
    /// detects, so it is never an error. Each chunk recomputes every parity
    /// row into a chunk-local scratch buffer and compares, stopping at the
    /// first mismatch.
    pub fn is_parity_correct(
        &self,
        shards: &[&[u8]],
        offset: usize,
        length: usize,
    ) -> Result<bool, CoderError> {
        self.check_geometry(shards.len(), shards.iter().map(|s| s.len()), offset, length)?;

        let inputs: SmallVec<[ShardInput; TYPICAL_SHARDS]> = shards[..self.data_shards]
            .iter()
            .map(|s| ShardInput::new(s))
            .collect();
        let parities: SmallVec<[ShardInput; TYPICAL_SHARDS]> = shards[self.data_shards..]
            .iter()
            .map(|s| ShardInput::new(s))
            .collect();
        let rows: SmallVec<[&[u8]; TYPICAL_SHARDS]> =
            self.parity_rows.iter().map(|r| &r[..]).collect();

        let chunks = length / CHUNK_SIZE;
        let whole = (0..chunks)
            .into_par_iter()
            .all(|chunk| check_chunk(&rows, &inputs, &parities, offset + chunk * CHUNK_SIZE, CHUNK_SIZE));
        if !whole {
            return Ok(false);
        }

        let done = chunks * CHUNK_SIZE;
        if done < length && !check_chunk(&rows, &inputs, &parities, offset + done, length - done) {
            return Ok(false);
        }
        Ok(true)
    }

    /// Reconstruct every shard marked absent in `present`, reading the
    /// window `[offset, offset + length)` of the shards still present.
    ///
    /// Succeeds trivially when nothing is missing and fails with
    /// [`CoderError::UnrecoverableLoss`] when fewer than `D` shards remain.
    /// Missing data shards are restored first, from the first `D` present
    /// shards through the inverted sub-matrix; missing parity shards are
    /// then recomputed directly from the restored data shards, so the two
    /// passes must stay in this order.
    pub fn decode_missing(
        &self,
        shards: &mut [&mut [u8]],
        present: &[bool],
        offset: usize,
        length: usize,
    ) -> Result<(), CoderError> {
        self.check_geometry(shards.len(), shards.iter().map(|s| s.len()), offset, length)?;
        if present.len() != self.total_shards {
            return Err(CoderError::InvalidShape(format!(
                "expected {} presence flags, got {}",
                self.total_shards,
                present.len()
            )));
        }

        let number_present = present.iter().filter(|&&p| p).count();
        if number_present == self.total_shards {
            return Ok(());
        }
        if number_present < self.data_shards {
            return Err(CoderError::UnrecoverableLoss {
                present: number_present,
                required: self.data_shards,
            });
        }

        debug!(
            "decoding {} missing of {} shards over [{}, {})",
            self.total_shards - number_present,
            self.total_shards,
            offset,
            offset + length
        );

        // Base pointers for every shard; each pass below reads present
        // shards and writes missing ones, which the presence flags keep
        // disjoint.
        let ptrs: SmallVec<[*mut u8; TYPICAL_SHARDS]> =
            shards.iter_mut().map(|s| s.as_mut_ptr()).collect();

        // Sub-matrix from the first D present rows of the coding matrix,
        // alongside the shards those rows correspond to.
        let mut sub_matrix = Matrix::new(self.data_shards, self.data_shards);
        let mut sub_inputs: SmallVec<[ShardInput; TYPICAL_SHARDS]> = SmallVec::new();
        for (i, &is_present) in present.iter().enumerate() {
            if sub_inputs.len() == self.data_shards {
                break;
            }
            if is_present {
                let row = sub_inputs.len();
                sub_matrix
                    .row_mut(row)?
                    .copy_from_slice(self.matrix.row(i)?);
                sub_inputs.push(ShardInput(ptrs[i] as *const u8));
            }
        }
        let decode_matrix = sub_matrix.invert()?;
        debug!("data-decode matrix inverted");

        // Pass 1: restore missing data shards from the selected present
        // shards.
        let mut rows: SmallVec<[&[u8]; TYPICAL_SHARDS]> = SmallVec::new();
        let mut outputs: SmallVec<[ShardOutput; TYPICAL_SHARDS]> = SmallVec::new();
        for i in 0..self.data_shards {
            if !present[i] {
                rows.push(decode_matrix.row_bytes(i)?);
                outputs.push(ShardOutput(ptrs[i]));
            }
        }
        code_some_shards(&rows, &sub_inputs, &outputs, offset, length);

        // Pass 2: recompute missing parity shards from the now-complete
        // data shards.
        let data_inputs: SmallVec<[ShardInput; TYPICAL_SHARDS]> = ptrs[..self.data_shards]
            .iter()
            .map(|&p| ShardInput(p as *const u8))
            .collect();
        let mut rows: SmallVec<[&[u8]; TYPICAL_SHARDS]> = SmallVec::new();
        let mut outputs: SmallVec<[ShardOutput; TYPICAL_SHARDS]> = SmallVec::new();
        for i in self.data_shards..self.total_shards {
            if !present[i] {
                rows.push(&self.parity_rows[i - self.data_shards]);
                outputs.push(ShardOutput(ptrs[i]));
            }
        }
        code_some_shards(&rows, &data_inputs, &outputs, offset, length);

        Ok(())
    }

    fn check_geometry(
        &self,
        shard_count: usize,
        shard_lens: impl Iterator<Item = usize>,
        offset: usize,
        length: usize,
    ) -> Result<(), CoderError> {
        if shard_count != self.total_shards {
            return Err(CoderError::InvalidShape(format!(
                "expected {} shards, got {}",
                self.total_shards, shard_count
            )));
        }
        let end = offset.checked_add(length).ok_or_else(|| {
            CoderError::InvalidShape("window end overflows usize".into())
        })?;
        for (i, len) in shard_lens.enumerate() {
            if len < end {
                return Err(CoderError::InvalidShape(format!(
                    "shard {} holds {} bytes but the window ends at {}",
                    i, len, end
                )));
            }
        }
        Ok(())
    }
}

/// Build the systematic coding matrix: a `(total x data)` Vandermonde matrix
/// times the inverse of its top square block. The top block of the result is
/// the identity, and any `data`-row subset remains invertible.
fn build_coding_matrix(data_shards: usize, total_shards: usize) -> Result<Matrix, MatrixError> {
    let vandermonde = vandermonde(total_shards, data_shards)?;
    let top = vandermonde.submatrix(0, 0, data_shards, data_shards)?;
    vandermonde.times(&top.invert()?)
}

fn vandermonde(rows: usize, cols: usize) -> Result<Matrix, MatrixError> {
    let mut result = Matrix::new(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            result.set(r, c, Gf8::new(r as u8).pow(c))?;
        }
    }
    Ok(result)
}

/// Run the coding kernel over the window for every (matrix row, output
/// shard) pair: full chunks in parallel, the remainder on this thread.
fn code_some_shards(
    matrix_rows: &[&[u8]],
    inputs: &[ShardInput],
    outputs: &[ShardOutput],
    offset: usize,
    length: usize,
) {
    debug_assert_eq!(matrix_rows.len(), outputs.len());
    if outputs.is_empty() {
        return;
    }

    let chunks = length / CHUNK_SIZE;
    (0..chunks).into_par_iter().for_each(|chunk| {
        code_chunk(matrix_rows, inputs, outputs, offset + chunk * CHUNK_SIZE, CHUNK_SIZE);
    });

    let done = chunks * CHUNK_SIZE;
    if done < length {
        code_chunk(matrix_rows, inputs, outputs, offset + done, length - done);
    }
}

/// One chunk of one pass: for each output, initialise with `multiply` on the
/// first input, then accumulate the rest with `multiply_xor`.
fn code_chunk(
    matrix_rows: &[&[u8]],
    inputs: &[ShardInput],
    outputs: &[ShardOutput],
    start: usize,
    len: usize,
) {
    for (output, row) in outputs.iter().zip(matrix_rows) {
        debug_assert_eq!(row.len(), inputs.len());
        // SAFETY: the window is in bounds of every shard (validated at the
        // public surface) and this task is the only writer of this
        // (output, chunk) pair.
        let out = unsafe { output.slice_mut(start, len) };
        kernel::multiply(row[0], unsafe { inputs[0].slice(start, len) }, out);
        for (input, &k) in inputs.iter().zip(row.iter()).skip(1) {
            kernel::multiply_xor(k, unsafe { input.slice(start, len) }, out);
        }
    }
}

/// Recompute every parity row for one chunk into chunk-local scratch and
/// compare against the stored parity bytes.
fn check_chunk(
    matrix_rows: &[&[u8]],
    inputs: &[ShardInput],
    parities: &[ShardInput],
    start: usize,
    len: usize,
) -> bool {
    let mut scratch = vec![0u8; len];
    for (parity, row) in parities.iter().zip(matrix_rows) {
        // SAFETY: the window is in bounds of every shard (validated at the
        // public surface); parity shards are only read here.
        kernel::multiply(row[0], unsafe { inputs[0].slice(start, len) }, &mut scratch);
        for (input, &k) in inputs.iter().zip(row.iter()).skip(1) {
            kernel::multiply_xor(k, unsafe { input.slice(start, len) }, &mut scratch);
        }
        if scratch.as_slice() != unsafe { parity.slice(start, len) } {
            return false;
        }
    }
    true
}
