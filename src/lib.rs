//! reed-solomon-8 - Systematic Reed-Solomon erasure coding over GF(2^8)
//!
//! ## Overview
//!
//! Splits an object into `D` data shards and computes `P` parity shards such
//! that the object survives the loss of any `P` of the `D + P` shards. The
//! code is systematic: data shards pass through encoding unchanged, so reads
//! of an intact object never touch the decoder.
//!
//! The coding matrix is a Vandermonde construction over GF(2^8) with
//! generating polynomial 0x11D, normalised so its top block is the identity.
//! `D + P` may not exceed 255.
//!
//! ## Performance
//!
//! The byte kernel evaluates GF(2^8) multiplication as two 16-entry
//! split-nybble table lookups, which maps onto byte-shuffle instructions
//! (PSHUFB on x86_64, TBL on aarch64) for 16-32 lanes per instruction, with
//! runtime CPU feature detection and a scalar fallback. Coding windows are
//! cut into 4096-byte chunks and fanned out on the shared rayon pool.
//!
//! ## Example
//!
//! ```
//! use reed_solomon_8::Coder;
//!
//! let coder = Coder::new(4, 2)?;
//! let mut storage = vec![vec![0u8; 1024]; 6];
//! for (i, shard) in storage.iter_mut().take(4).enumerate() {
//!     shard.fill(i as u8 + 1);
//! }
//! let mut shards: Vec<&mut [u8]> = storage.iter_mut().map(|s| &mut s[..]).collect();
//! coder.encode_parity(&mut shards, 0, 1024)?;
//!
//! // Lose two shards, then reconstruct them.
//! shards[1].fill(0);
//! shards[5].fill(0);
//! let present = [true, false, true, true, true, false];
//! coder.decode_missing(&mut shards, &present, 0, 1024)?;
//! # Ok::<(), reed_solomon_8::CoderError>(())
//! ```

pub mod coder;
pub mod encoder;
pub mod galois;
pub mod kernel;
pub mod matrix;

pub use coder::{Coder, CoderError};
pub use encoder::{Encoder, ShardBuffer};
pub use galois::Gf8;
pub use kernel::SimdLevel;
pub use matrix::{Matrix, MatrixError};
