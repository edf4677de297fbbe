//! Serialized sketch signatures.
//!
//! The export contract of a sketch is its admitted hashes plus the
//! configuration needed to rebuild or compare it: `k`, the sample size, the
//! visit count, the seed and the hash-function tag. [`Signature`] is that
//! contract as a serde record with a JSON encoding; other layouts can be
//! built on the same fields.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};
use crate::frozen::{FrozenCountSketch, FrozenSketch};
use crate::hash::{HasherId, KmerHasher};
use crate::sketch::{BottomCountSketch, BottomSketch, SetSketch, TopCountSketch, TopSketch};

/// On-the-wire form of a frozen sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub k: usize,
    pub max_size: usize,
    pub nvisited: u64,
    pub seed: u64,
    /// Hash-function tag, `HasherId` through `Display`/`FromStr`.
    pub hasher: String,
    /// Admitted hashes, ascending.
    pub hashes: Vec<u64>,
    /// Per-hash counts aligned with `hashes`, when the sketch tracked them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u64>>,
}

impl Signature {
    pub fn from_frozen(name: impl Into<String>, sketch: &FrozenSketch) -> Self {
        Signature {
            name: name.into(),
            k: sketch.k(),
            max_size: sketch.max_size(),
            nvisited: sketch.nvisited(),
            seed: sketch.seed(),
            hasher: sketch.hasher_id().to_string(),
            hashes: sketch.hashes().to_vec(),
            counts: None,
        }
    }

    pub fn from_frozen_counts(name: impl Into<String>, sketch: &FrozenCountSketch) -> Self {
        let mut signature = Self::from_frozen(name, sketch.as_sketch());
        signature.counts = Some(sketch.counts().to_vec());
        signature
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parsed hash-function tag.
    pub fn hasher_id(&self) -> Result<HasherId> {
        self.hasher.parse()
    }

    /// Rebuild the frozen view.
    pub fn to_frozen(&self) -> Result<FrozenSketch> {
        FrozenSketch::from_parts(
            self.hashes.clone(),
            self.k,
            self.max_size,
            self.nvisited,
            self.seed,
            self.hasher_id()?,
        )
    }

    /// Rebuild the frozen view including counts.
    ///
    /// # Errors
    /// [`SketchError::InvalidArgument`] when the signature carries no counts.
    pub fn to_frozen_counts(&self) -> Result<FrozenCountSketch> {
        let Some(counts) = &self.counts else {
            return Err(SketchError::InvalidArgument(
                "signature carries no counts",
            ));
        };
        FrozenCountSketch::from_parts(
            self.hashes.clone(),
            counts.clone(),
            self.k,
            self.max_size,
            self.nvisited,
            self.seed,
            self.hasher_id()?,
        )
    }

    fn ensure_hasher(&self, hasher: &Arc<dyn KmerHasher>) -> Result<()> {
        let tagged = self.hasher_id()?;
        if tagged != hasher.id() {
            return Err(SketchError::IncompatibleSketch(format!(
                "signature was built with {} but {} was supplied",
                tagged,
                hasher.id()
            )));
        }
        Ok(())
    }

    fn thaw<const TOP: bool>(
        &self,
        hasher: Arc<dyn KmerHasher>,
    ) -> Result<SetSketch<TOP, false>> {
        self.ensure_hasher(&hasher)?;
        let elements = self.hashes.iter().map(|&h| (h, Vec::new()));
        SetSketch::with_elements(
            self.k,
            self.max_size,
            hasher,
            self.seed,
            elements,
            self.nvisited,
        )
    }

    fn thaw_counting<const TOP: bool>(
        &self,
        hasher: Arc<dyn KmerHasher>,
    ) -> Result<SetSketch<TOP, true>> {
        self.ensure_hasher(&hasher)?;
        let Some(counts) = &self.counts else {
            return Err(SketchError::InvalidArgument(
                "signature carries no counts",
            ));
        };
        if counts.len() != self.hashes.len() {
            return Err(SketchError::InvalidArgument(
                "hashes and counts must have the same length",
            ));
        }
        let elements = self.hashes.iter().map(|&h| (h, Vec::new())).collect();
        let count_map = self.hashes.iter().copied().zip(counts.iter().copied()).collect();
        SetSketch::with_element_counts(
            self.k,
            self.max_size,
            hasher,
            self.seed,
            elements,
            &count_map,
            self.nvisited,
        )
    }

    /// Rebuild a mutable top sketch that can keep ingesting sequences. The
    /// supplied hasher must match the signature's tag.
    pub fn thaw_top(&self, hasher: Arc<dyn KmerHasher>) -> Result<TopSketch> {
        self.thaw(hasher)
    }

    /// Rebuild a mutable bottom sketch.
    pub fn thaw_bottom(&self, hasher: Arc<dyn KmerHasher>) -> Result<BottomSketch> {
        self.thaw(hasher)
    }

    /// Rebuild a mutable counting top sketch.
    pub fn thaw_top_counts(&self, hasher: Arc<dyn KmerHasher>) -> Result<TopCountSketch> {
        self.thaw_counting(hasher)
    }

    /// Rebuild a mutable counting bottom sketch.
    pub fn thaw_bottom_counts(&self, hasher: Arc<dyn KmerHasher>) -> Result<BottomCountSketch> {
        self.thaw_counting(hasher)
    }
}
