//! # stream-mash
//!
//! Streaming MinHash-style set sketches of long byte sequences, typically
//! DNA. A sketch keeps a bounded sample of the k-mer hash values it has
//! seen: either the `m` largest ([`TopSketch`]) or the `m` smallest
//! ([`BottomSketch`]), with counting variants that also track how often each
//! sampled hash was observed. Two huge inputs can then be compared by
//! comparing two small sketches.
//!
//! ## Hash functions
//! Hashing is pluggable behind the [`KmerHasher`] trait: given a byte slice,
//! a k-mer length, an output buffer and a seed, an implementation writes the
//! 64-bit hash of every k-mer in the slice. Built-ins are
//! [`Murmur3Hasher`] (MurmurHash3 x64_128, lower 64 bits),
//! [`Xxh64Hasher`] (xxHash64), and the strand-agnostic [`MashHasher`] which
//! hashes `min(kmer, revcomp(kmer))` the way MASH and sourmash do.
//!
//! ## Streaming
//! Long inputs are tiled by [`chunk::chunk_windows`] into windows that
//! overlap by exactly `k - 1` bytes, so every k-mer is hashed exactly once
//! no matter how the input is sliced, and hashing runs batched through a
//! reusable buffer.
//!
//! ## Merging
//! Sketches with the same `k`, seed and hash function merge: in place with
//! [`SetSketch::update`], out of place with [`SetSketch::merge`]. Merging is
//! associative and commutative on the admitted set and additive on counts
//! and on `nvisited`, which is what makes the parallel driver's unordered
//! reduction valid.
//!
//! ## Parallel sketching
//! [`ParallelSketcher`] fans sequences out over the rayon thread pool; each
//! worker owns a fresh identically configured sketch and the partials are
//! folded unordered. [`SketchList`] feeds several sketches (say, a top and a
//! bottom sketch) from one pass over the data.
//!
//! ## Queries
//! [`SetSketch::freeze`] produces an immutable [`FrozenSketch`] (or
//! [`FrozenCountSketch`]) supporting Jaccard similarity and containment,
//! Dice similarity, and Bray-Curtis dissimilarity over counts.
//! [`Signature`] serializes the whole export contract as JSON.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use stream_mash::{BottomSketch, Murmur3Hasher, DEFAULT_SEED};
//!
//! let hasher = Arc::new(Murmur3Hasher);
//!
//! let mut a = BottomSketch::new(4, 16, hasher.clone(), DEFAULT_SEED)?;
//! let mut b = BottomSketch::new(4, 16, hasher, DEFAULT_SEED)?;
//! a.add(b"ACGTACGTTGCAGGTTACAGCTAACGGT")?;
//! b.add(b"ACGTACGTTGCAGGTTACAGGTAACGCT")?;
//!
//! // Fraction of shared k-mer hashes, between 0 and 1.
//! let similarity = a.freeze().jaccard_similarity(&b.freeze())?;
//! assert!(similarity > 0.0);
//! # Ok::<(), stream_mash::SketchError>(())
//! ```

pub mod chunk;
pub mod error;
pub mod frozen;
pub mod hash;
pub mod mash;
pub mod parallel;
pub mod signature;
pub mod sketch;

pub use error::{Result, SketchError};
pub use hash::{
    DEFAULT_BUFFER_LEN, DEFAULT_SEED, HasherId, KmerHasher, Murmur3Hasher, Xxh64Hasher,
};
pub use frozen::{FrozenCountSketch, FrozenSketch};
pub use mash::{MashHasher, revcomp};
pub use parallel::{AnySketch, ParallelSketcher, SketchKind, SketchList, SketchParams};
pub use signature::Signature;
pub use sketch::{
    BottomCountSketch, BottomSketch, SetSketch, StreamSketch, TopCountSketch, TopSketch,
};
