//! Buffer allocation and a whole-object facade over [`Coder`]
//!
//! [`ShardBuffer`] owns one contiguous zero-filled allocation holding all
//! `D+P` shards at a fixed stride, with an optional leading padding region
//! per shard. Parity only covers the payload region `[padding, shard_size)`;
//! the padding is application-managed space, typically used to replicate a
//! small length prefix into every shard so any surviving shard can recover
//! the original object size. Persisted shards are plain byte streams of
//! `shard_size` bytes with no framing, header or checksum.

use crate::coder::{Coder, CoderError};

/// Shard stride and padding granularity in bytes.
pub const ALIGNMENT: usize = 16;

fn align_up(n: usize, alignment: usize) -> usize {
    (n + alignment - 1) & !(alignment - 1)
}

/// One contiguous allocation divided into equally sized shards.
pub struct ShardBuffer {
    data: Vec<u8>,
    shard_size: usize,
    shard_count: usize,
    padding_size: usize,
}

impl ShardBuffer {
    fn new(shard_size: usize, shard_count: usize, padding_size: usize) -> Self {
        Self {
            data: vec![0u8; shard_size * shard_count],
            shard_size,
            shard_count,
            padding_size,
        }
    }

    pub fn shard_size(&self) -> usize {
        self.shard_size
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn padding_size(&self) -> usize {
        self.padding_size
    }

    /// Bytes per shard covered by parity.
    pub fn payload_size(&self) -> usize {
        self.shard_size - self.padding_size
    }

    /// Borrow one shard, padding included.
    pub fn shard(&self, index: usize) -> &[u8] {
        &self.data[index * self.shard_size..(index + 1) * self.shard_size]
    }

    /// Borrow one shard mutably, padding included.
    pub fn shard_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.data[index * self.shard_size..(index + 1) * self.shard_size]
    }

    /// All shards as read-only slices, in index order.
    pub fn shards(&self) -> Vec<&[u8]> {
        self.data.chunks_exact(self.shard_size).collect()
    }

    /// All shards as mutable slices, in index order.
    pub fn shards_mut(&mut self) -> Vec<&mut [u8]> {
        self.data.chunks_exact_mut(self.shard_size).collect()
    }
}

/// Convenience facade tying a [`Coder`] to [`ShardBuffer`] allocation.
pub struct Encoder {
    coder: Coder,
}

impl Encoder {
    pub fn new(data_shards: u8, parity_shards: u8) -> Result<Self, CoderError> {
        Ok(Self {
            coder: Coder::new(data_shards, parity_shards)?,
        })
    }

    pub fn coder(&self) -> &Coder {
        &self.coder
    }

    pub fn data_shard_count(&self) -> usize {
        self.coder.data_shard_count()
    }

    pub fn shard_count(&self) -> usize {
        self.coder.total_shard_count()
    }

    /// Allocate shards sized to hold `object_size` bytes of payload spread
    /// across the data shards, rounded up to the alignment granule.
    pub fn allocate_from_object_size(&self, object_size: usize) -> ShardBuffer {
        self.allocate_from_object_size_padded(object_size, 0)
    }

    /// Like [`allocate_from_object_size`](Self::allocate_from_object_size),
    /// with at least `minimum_padding` reserved bytes leading every shard.
    pub fn allocate_from_object_size_padded(
        &self,
        object_size: usize,
        minimum_padding: usize,
    ) -> ShardBuffer {
        let padding_size = align_up(minimum_padding, ALIGNMENT);
        let per_shard = object_size.div_ceil(self.data_shard_count());
        let shard_size = padding_size + align_up(per_shard, ALIGNMENT);
        ShardBuffer::new(shard_size, self.shard_count(), padding_size)
    }

    /// Allocate shards of an exact size, e.g. to reload persisted shards.
    pub fn allocate_from_shard_size(&self, shard_size: usize) -> ShardBuffer {
        ShardBuffer::new(shard_size, self.shard_count(), 0)
    }

    /// Like [`allocate_from_shard_size`](Self::allocate_from_shard_size),
    /// recording the padding region the shards were created with.
    pub fn allocate_from_shard_size_padded(
        &self,
        shard_size: usize,
        minimum_padding: usize,
    ) -> ShardBuffer {
        let padding_size = align_up(minimum_padding, ALIGNMENT);
        ShardBuffer::new(shard_size, self.shard_count(), padding_size)
    }

    /// Encode parity over the buffer's payload window.
    pub fn encode(&self, buffer: &mut ShardBuffer) -> Result<(), CoderError> {
        let (offset, length) = (buffer.padding_size(), buffer.payload_size());
        let mut shards = buffer.shards_mut();
        self.coder.encode_parity(&mut shards, offset, length)
    }

    /// Verify parity over the buffer's payload window.
    pub fn verify(&self, buffer: &ShardBuffer) -> Result<bool, CoderError> {
        let (offset, length) = (buffer.padding_size(), buffer.payload_size());
        self.coder.is_parity_correct(&buffer.shards(), offset, length)
    }

    /// Reconstruct the shards marked absent over the payload window.
    pub fn repair(&self, buffer: &mut ShardBuffer, present: &[bool]) -> Result<(), CoderError> {
        let (offset, length) = (buffer.padding_size(), buffer.payload_size());
        let mut shards = buffer.shards_mut();
        self.coder.decode_missing(&mut shards, present, offset, length)
    }
}
