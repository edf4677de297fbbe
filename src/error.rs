//! Error type shared by all sketch operations.

use thiserror::Error;

/// Errors surfaced by sketch construction, ingestion, merging and queries.
///
/// Nothing in this crate retries: every error is returned to the caller at
/// the call that triggered it, and a failed parallel worker aborts the whole
/// job.
#[derive(Debug, Error)]
pub enum SketchError {
    /// A parameter violated a precondition (`k`, `m`, buffer length,
    /// chunker window, broadcast lengths).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Two sketches with differing `k`, seed, hash function or kind were
    /// merged or compared.
    #[error("incompatible sketches: {0}")]
    IncompatibleSketch(String),

    /// A preloaded heap contained the same hash twice, or preloaded counts
    /// disagreed with the heap contents.
    #[error("duplicate hash {0:#018x} in preloaded sketch state")]
    DuplicateSeed(u64),

    /// A hash function could not fit its output into the supplied buffer.
    #[error("hash buffer too small: {needed} slots needed, {capacity} available")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// A signature could not be encoded or decoded.
    #[error("signature encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SketchError>;
