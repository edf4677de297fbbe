//! Immutable sketch snapshots and similarity queries.
//!
//! A frozen sketch is the read-only projection of a mutable sketch: the
//! admitted hashes in sorted order plus the configuration needed to decide
//! whether two sketches may be compared. Set sizes for the similarity
//! estimates come from a two-pointer walk over the sorted hash arrays.

use crate::error::{Result, SketchError};
use crate::hash::HasherId;

/// Read-only sample of hash values supporting set-similarity queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSketch {
    hashes: Vec<u64>,
    k: usize,
    max_size: usize,
    nvisited: u64,
    seed: u64,
    hasher_id: HasherId,
}

/// Size of the intersection of two sorted, deduplicated hash slices.
fn intersection_size(a: &[u64], b: &[u64]) -> usize {
    let mut shared = 0;
    let mut i = 0;
    let mut j = 0;
    while i < a.len() && j < b.len() {
        shared += (a[i] == b[j]) as usize;
        let di = (a[i] <= b[j]) as usize;
        let dj = (a[i] >= b[j]) as usize;
        i += di;
        j += dj;
    }
    shared
}

impl FrozenSketch {
    /// Freeze without re-validating: the mutable sketch upholds the
    /// invariants already.
    pub(crate) fn from_sketch(
        hashes: Vec<u64>,
        k: usize,
        max_size: usize,
        nvisited: u64,
        seed: u64,
        hasher_id: HasherId,
    ) -> Self {
        debug_assert!(hashes.is_sorted());
        FrozenSketch {
            hashes,
            k,
            max_size,
            nvisited,
            seed,
            hasher_id,
        }
    }

    /// Build a frozen sketch from raw parts, e.g. a deserialized signature.
    ///
    /// # Errors
    /// [`SketchError::DuplicateSeed`] on repeated hashes,
    /// [`SketchError::InvalidArgument`] when `max_size` or `nvisited` is
    /// smaller than the number of hashes.
    pub fn from_parts(
        mut hashes: Vec<u64>,
        k: usize,
        max_size: usize,
        nvisited: u64,
        seed: u64,
        hasher_id: HasherId,
    ) -> Result<Self> {
        if k == 0 {
            return Err(SketchError::InvalidArgument("k must be at least 1"));
        }
        hashes.sort_unstable();
        if let Some(dup) = hashes.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SketchError::DuplicateSeed(dup[0]));
        }
        if max_size < hashes.len() {
            return Err(SketchError::InvalidArgument(
                "max_size cannot be smaller than the number of hashes",
            ));
        }
        if nvisited < hashes.len() as u64 {
            return Err(SketchError::InvalidArgument(
                "nvisited cannot be smaller than the number of hashes",
            ));
        }
        Ok(FrozenSketch {
            hashes,
            k,
            max_size,
            nvisited,
            seed,
            hasher_id,
        })
    }

    /// Admitted hashes, ascending.
    pub fn hashes(&self) -> &[u64] {
        &self.hashes
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn nvisited(&self) -> u64 {
        self.nvisited
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn hasher_id(&self) -> HasherId {
        self.hasher_id
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, h: u64) -> bool {
        self.hashes.binary_search(&h).is_ok()
    }

    fn ensure_comparable(&self, other: &Self) -> Result<()> {
        if self.k != other.k {
            return Err(SketchError::IncompatibleSketch(format!(
                "k mismatch: {} vs {}",
                self.k, other.k
            )));
        }
        if self.seed != other.seed {
            return Err(SketchError::IncompatibleSketch(format!(
                "seed mismatch: {} vs {}",
                self.seed, other.seed
            )));
        }
        if self.hasher_id != other.hasher_id {
            return Err(SketchError::IncompatibleSketch(format!(
                "hash function mismatch: {} vs {}",
                self.hasher_id, other.hasher_id
            )));
        }
        Ok(())
    }

    /// `|A ∩ B| / |A ∪ B|`. Two empty sketches count as identical.
    pub fn jaccard_similarity(&self, other: &Self) -> Result<f64> {
        self.ensure_comparable(other)?;
        let shared = intersection_size(&self.hashes, &other.hashes);
        let union = self.len() + other.len() - shared;
        if union == 0 {
            return Ok(1.0);
        }
        Ok(shared as f64 / union as f64)
    }

    /// `|A ∩ B| / |A|`: the fraction of this sketch found in `other`. An
    /// empty sketch is vacuously contained.
    pub fn jaccard_containment(&self, other: &Self) -> Result<f64> {
        self.ensure_comparable(other)?;
        if self.is_empty() {
            return Ok(1.0);
        }
        let shared = intersection_size(&self.hashes, &other.hashes);
        Ok(shared as f64 / self.len() as f64)
    }

    /// Soerensen-Dice: `2|A ∩ B| / (2|A ∩ B| + |A \ B| + |B \ A|)`.
    pub fn dice_similarity(&self, other: &Self) -> Result<f64> {
        self.ensure_comparable(other)?;
        let shared = intersection_size(&self.hashes, &other.hashes);
        let only_self = self.len() - shared;
        let only_other = other.len() - shared;
        let denominator = 2 * shared + only_self + only_other;
        if denominator == 0 {
            return Ok(1.0);
        }
        Ok(2.0 * shared as f64 / denominator as f64)
    }
}

/// [`FrozenSketch`] plus per-hash occurrence counts, aligned with the sorted
/// hash array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenCountSketch {
    base: FrozenSketch,
    counts: Vec<u64>,
}

impl FrozenCountSketch {
    pub(crate) fn from_sketch(
        hashes: Vec<u64>,
        counts: Vec<u64>,
        k: usize,
        max_size: usize,
        nvisited: u64,
        seed: u64,
        hasher_id: HasherId,
    ) -> Self {
        debug_assert_eq!(hashes.len(), counts.len());
        FrozenCountSketch {
            base: FrozenSketch::from_sketch(hashes, k, max_size, nvisited, seed, hasher_id),
            counts,
        }
    }

    /// Build from raw parts; `counts[i]` belongs to the `i`-th hash of
    /// `hashes` *as given* (the pair is sorted together).
    ///
    /// # Errors
    /// As [`FrozenSketch::from_parts`]; additionally
    /// [`SketchError::InvalidArgument`] when the lengths differ or a count
    /// is below 1.
    pub fn from_parts(
        hashes: Vec<u64>,
        counts: Vec<u64>,
        k: usize,
        max_size: usize,
        nvisited: u64,
        seed: u64,
        hasher_id: HasherId,
    ) -> Result<Self> {
        if hashes.len() != counts.len() {
            return Err(SketchError::InvalidArgument(
                "hashes and counts must have the same length",
            ));
        }
        if counts.iter().any(|&count| count == 0) {
            return Err(SketchError::InvalidArgument("counts must be at least 1"));
        }
        let mut paired: Vec<(u64, u64)> = hashes.into_iter().zip(counts).collect();
        paired.sort_unstable_by_key(|&(h, _)| h);
        let (hashes, counts): (Vec<u64>, Vec<u64>) = paired.into_iter().unzip();
        let base = FrozenSketch::from_parts(hashes, k, max_size, nvisited, seed, hasher_id)?;
        Ok(FrozenCountSketch { base, counts })
    }

    /// The set-level view, for the plain similarity queries.
    pub fn as_sketch(&self) -> &FrozenSketch {
        &self.base
    }

    pub fn hashes(&self) -> &[u64] {
        self.base.hashes()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn count_of(&self, h: u64) -> Option<u64> {
        self.base
            .hashes
            .binary_search(&h)
            .ok()
            .map(|index| self.counts[index])
    }

    pub fn jaccard_similarity(&self, other: &Self) -> Result<f64> {
        self.base.jaccard_similarity(&other.base)
    }

    pub fn jaccard_containment(&self, other: &Self) -> Result<f64> {
        self.base.jaccard_containment(&other.base)
    }

    pub fn dice_similarity(&self, other: &Self) -> Result<f64> {
        self.base.dice_similarity(&other.base)
    }

    /// Bray-Curtis dissimilarity over the surviving counts:
    /// `1 − 2·Σ_{h ∈ A∩B} count_A[h] / (Σ count_A + Σ count_B)`.
    /// Two empty sketches are identical, dissimilarity 0.
    pub fn bray_curtis_dissimilarity(&self, other: &Self) -> Result<f64> {
        self.base.ensure_comparable(&other.base)?;
        let mut shared_mass = 0u64;
        let a = self.base.hashes();
        let b = other.base.hashes();
        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            if a[i] == b[j] {
                shared_mass += self.counts[i];
                i += 1;
                j += 1;
            } else if a[i] < b[j] {
                i += 1;
            } else {
                j += 1;
            }
        }
        let total: u64 = self.counts.iter().sum::<u64>() + other.counts.iter().sum::<u64>();
        if total == 0 {
            return Ok(0.0);
        }
        Ok(1.0 - (2 * shared_mass) as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen(hashes: Vec<u64>) -> FrozenSketch {
        FrozenSketch::from_parts(hashes, 3, 10, 20, 42, HasherId::Murmur3).unwrap()
    }

    #[test]
    fn known_set_overlap() {
        let a = frozen(vec![1, 2, 3, 4, 5]);
        let b = frozen(vec![1, 2, 3, 6, 7]);
        assert_eq!(a.jaccard_similarity(&b).unwrap(), 3.0 / 7.0);
        assert_eq!(a.jaccard_containment(&b).unwrap(), 3.0 / 5.0);
        assert_eq!(a.dice_similarity(&b).unwrap(), 6.0 / 10.0);
    }

    #[test]
    fn similarity_bounds_and_identity() {
        let a = frozen(vec![10, 20, 30]);
        let b = frozen(vec![40, 50]);
        assert_eq!(a.jaccard_similarity(&a.clone()).unwrap(), 1.0);
        assert_eq!(a.jaccard_similarity(&b).unwrap(), 0.0);
        let j = a.jaccard_similarity(&b).unwrap();
        let d = a.dice_similarity(&b).unwrap();
        assert!((0.0..=1.0).contains(&j));
        assert!(d >= j);
    }

    #[test]
    fn empty_sketches_compare_as_identical() {
        let a = frozen(vec![]);
        let b = frozen(vec![]);
        assert_eq!(a.jaccard_similarity(&b).unwrap(), 1.0);
        assert_eq!(a.dice_similarity(&b).unwrap(), 1.0);
        assert_eq!(a.jaccard_containment(&frozen(vec![1])).unwrap(), 1.0);
    }

    #[test]
    fn mismatched_configuration_is_rejected() {
        let a = frozen(vec![1, 2]);
        let other_k = FrozenSketch::from_parts(vec![1, 2], 4, 10, 20, 42, HasherId::Murmur3)
            .unwrap();
        let other_seed =
            FrozenSketch::from_parts(vec![1, 2], 3, 10, 20, 7, HasherId::Murmur3).unwrap();
        let other_fun =
            FrozenSketch::from_parts(vec![1, 2], 3, 10, 20, 42, HasherId::Xxh64).unwrap();
        assert!(a.jaccard_similarity(&other_k).is_err());
        assert!(a.jaccard_similarity(&other_seed).is_err());
        assert!(a.dice_similarity(&other_fun).is_err());
    }

    #[test]
    fn from_parts_validates() {
        assert!(matches!(
            FrozenSketch::from_parts(vec![1, 1], 3, 10, 20, 42, HasherId::Murmur3),
            Err(SketchError::DuplicateSeed(1))
        ));
        assert!(
            FrozenSketch::from_parts(vec![1, 2, 3], 3, 2, 20, 42, HasherId::Murmur3).is_err()
        );
        assert!(
            FrozenSketch::from_parts(vec![1, 2, 3], 3, 10, 2, 42, HasherId::Murmur3).is_err()
        );
    }

    #[test]
    fn bray_curtis_over_surviving_counts() {
        let a = FrozenCountSketch::from_parts(
            vec![1, 2, 3],
            vec![2, 1, 1],
            3,
            10,
            20,
            42,
            HasherId::Murmur3,
        )
        .unwrap();
        let b = FrozenCountSketch::from_parts(
            vec![1, 2, 4],
            vec![1, 1, 1],
            3,
            10,
            20,
            42,
            HasherId::Murmur3,
        )
        .unwrap();
        // Shared mass from a: 2 + 1; totals 4 and 3.
        assert_eq!(a.bray_curtis_dissimilarity(&b).unwrap(), 1.0 - 6.0 / 7.0);
        assert_eq!(a.bray_curtis_dissimilarity(&a.clone()).unwrap(), 0.0);
        assert_eq!(a.count_of(1), Some(2));
        assert_eq!(a.count_of(9), None);
    }

    #[test]
    fn count_sketch_validates_counts() {
        assert!(
            FrozenCountSketch::from_parts(vec![1], vec![], 3, 10, 20, 42, HasherId::Murmur3)
                .is_err()
        );
        assert!(
            FrozenCountSketch::from_parts(vec![1], vec![0], 3, 10, 20, 42, HasherId::Murmur3)
                .is_err()
        );
    }
}
