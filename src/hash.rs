//! Pluggable k-mer hash functions.
//!
//! A hash function fills a caller-supplied buffer with the 64-bit hash of
//! every length-`k` subword of a byte slice. Batching through a buffer keeps
//! the sketch inner loop free of per-k-mer dispatch, and the buffer doubles
//! as the window width for [`crate::chunk::chunk_windows`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SketchError};

/// Seed shared with MASH and sourmash.
pub const DEFAULT_SEED: u64 = 42;

/// Default length of the reusable hash buffer used by `add`.
pub const DEFAULT_BUFFER_LEN: usize = 250;

/// Identity of a hash function.
///
/// Two sketches merge or compare only when their hashers carry the same id,
/// so the id has to survive a trip through a serialized signature; pointer
/// identity of the hasher object is not enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HasherId {
    /// MurmurHash3 x64_128, lower 64 bits.
    Murmur3,
    /// xxHash64.
    Xxh64,
    /// Canonical (strand-agnostic) MurmurHash3 over `min(kmer, revcomp)`.
    MashMurmur3,
}

impl fmt::Display for HasherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            HasherId::Murmur3 => "murmur3",
            HasherId::Xxh64 => "xxh64",
            HasherId::MashMurmur3 => "mash-murmur3",
        };
        f.write_str(tag)
    }
}

impl FromStr for HasherId {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "murmur3" => Ok(HasherId::Murmur3),
            "xxh64" => Ok(HasherId::Xxh64),
            "mash-murmur3" => Ok(HasherId::MashMurmur3),
            _ => Err(SketchError::InvalidArgument("unknown hash function tag")),
        }
    }
}

/// Batched k-mer hashing over a byte slice.
///
/// Implementations must be pure: the same `(seq, k, seed)` always produces
/// the same hashes, on every platform, so that sketches built on different
/// machines stay mergeable.
pub trait KmerHasher: Send + Sync {
    /// Identity used to gate merges and to tag serialized signatures.
    fn id(&self) -> HasherId;

    /// Write the hash of every `seq[i..i + k]` into `out[i]` and return how
    /// many hashes were written: `seq.len() - k + 1`, or zero when the slice
    /// is shorter than `k`.
    ///
    /// # Errors
    /// [`SketchError::BufferTooSmall`] when `out` cannot hold the output.
    fn hash_kmers(&self, seq: &[u8], k: usize, out: &mut [u64], seed: u64) -> Result<usize>;
}

/// Number of k-mers in `seq`, with a buffer-capacity check.
pub(crate) fn kmer_count(seq: &[u8], k: usize, capacity: usize) -> Result<usize> {
    if k == 0 {
        return Err(SketchError::InvalidArgument("k must be at least 1"));
    }
    let n = seq.len().saturating_sub(k - 1);
    if n > capacity {
        return Err(SketchError::BufferTooSmall {
            needed: n,
            capacity,
        });
    }
    Ok(n)
}

/// MurmurHash3 x64_128, keeping the lower 64 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Hasher;

impl KmerHasher for Murmur3Hasher {
    fn id(&self) -> HasherId {
        HasherId::Murmur3
    }

    fn hash_kmers(&self, seq: &[u8], k: usize, out: &mut [u64], seed: u64) -> Result<usize> {
        let n = kmer_count(seq, k, out.len())?;
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = murmurhash3::murmurhash3_x64_128(&seq[i..i + k], seed).0;
        }
        Ok(n)
    }
}

/// xxHash64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh64Hasher;

impl KmerHasher for Xxh64Hasher {
    fn id(&self) -> HasherId {
        HasherId::Xxh64
    }

    fn hash_kmers(&self, seq: &[u8], k: usize, out: &mut [u64], seed: u64) -> Result<usize> {
        let n = kmer_count(seq, k, out.len())?;
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = xxhash_rust::xxh64::xxh64(&seq[i..i + k], seed);
        }
        Ok(n)
    }
}
