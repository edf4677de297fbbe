//! Bounded top-k / bottom-k sketches of hashed n-grams.
//!
//! A sketch keeps the `m` largest (top) or smallest (bottom) 64-bit k-mer
//! hashes ever offered to it. Membership is O(1) through a side index; the
//! eviction candidate sits at the root of a max-heap of *ranks*, where the
//! rank of a hash is the hash itself for bottom sketches and its bitwise
//! complement for top sketches. One heap implementation therefore serves
//! both polarities, and the root is always the worst-admitted hash.
//!
//! Polarity and counting are const generics, in the same spirit as a
//! forward/canonical hasher split: the four concrete shapes are
//! [`TopSketch`], [`BottomSketch`], [`TopCountSketch`] and
//! [`BottomCountSketch`].

use std::collections::hash_map::Entry as Slot;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::chunk::chunk_windows;
use crate::error::{Result, SketchError};
use crate::frozen::{FrozenCountSketch, FrozenSketch};
use crate::hash::{DEFAULT_BUFFER_LEN, HasherId, KmerHasher};

/// Sample of the `m` largest hashes.
pub type TopSketch = SetSketch<true, false>;
/// Sample of the `m` smallest hashes.
pub type BottomSketch = SetSketch<false, false>;
/// [`TopSketch`] that also tracks per-hash multiplicity.
pub type TopCountSketch = SetSketch<true, true>;
/// [`BottomSketch`] that also tracks per-hash multiplicity.
pub type BottomCountSketch = SetSketch<false, true>;

/// Admitted element: the subword bytes behind a hash, and how often the hash
/// was observed. The subword is empty for hashes ingested without one.
#[derive(Debug, Clone)]
struct Member {
    ngram: Box<[u8]>,
    count: u64,
}

/// Bounded multiset of hash values; see the [module docs](self).
///
/// `TOP` selects the polarity (largest vs smallest hashes), `COUNT` whether
/// per-hash occurrence counts are maintained.
#[derive(Clone)]
pub struct SetSketch<const TOP: bool, const COUNT: bool> {
    k: usize,
    max_size: usize,
    seed: u64,
    hasher: Arc<dyn KmerHasher>,
    /// Ranks; the root is the worst-admitted hash.
    heap: BinaryHeap<u64>,
    /// Hash -> admitted element, keys exactly the heap contents.
    members: HashMap<u64, Member>,
    nvisited: u64,
}

impl<const TOP: bool, const COUNT: bool> SetSketch<TOP, COUNT> {
    /// Rank of a hash in the shared max-heap. An involution: applying it to
    /// a rank recovers the hash.
    fn rank(h: u64) -> u64 {
        if TOP { !h } else { h }
    }

    fn better(h: u64, worst: u64) -> bool {
        if TOP { h > worst } else { h < worst }
    }

    /// Create an empty sketch for `k`-mers keeping at most `max_size`
    /// hashes.
    ///
    /// # Errors
    /// [`SketchError::InvalidArgument`] when `k == 0` or `max_size == 0`.
    pub fn new(k: usize, max_size: usize, hasher: Arc<dyn KmerHasher>, seed: u64) -> Result<Self> {
        if k == 0 {
            return Err(SketchError::InvalidArgument("k must be at least 1"));
        }
        if max_size == 0 {
            return Err(SketchError::InvalidArgument(
                "sketch size must be at least 1",
            ));
        }
        Ok(SetSketch {
            k,
            max_size,
            seed,
            hasher,
            heap: BinaryHeap::with_capacity(max_size),
            members: HashMap::with_capacity(max_size),
            nvisited: 0,
        })
    }

    /// Create a sketch preloaded with `(hash, subword)` elements.
    ///
    /// The elements must already satisfy the sample property for this
    /// polarity; the constructor only enforces structural consistency.
    ///
    /// # Errors
    /// [`SketchError::DuplicateSeed`] on a repeated hash,
    /// [`SketchError::InvalidArgument`] when the elements exceed `max_size`
    /// or `nvisited` is smaller than their number.
    pub fn with_elements<I>(
        k: usize,
        max_size: usize,
        hasher: Arc<dyn KmerHasher>,
        seed: u64,
        elements: I,
        nvisited: u64,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, Vec<u8>)>,
    {
        let mut sketch = Self::new(k, max_size, hasher, seed)?;
        for (h, ngram) in elements {
            if sketch.members.len() == max_size {
                return Err(SketchError::InvalidArgument(
                    "preloaded elements exceed the sketch size",
                ));
            }
            match sketch.members.entry(h) {
                Slot::Occupied(_) => return Err(SketchError::DuplicateSeed(h)),
                Slot::Vacant(slot) => {
                    slot.insert(Member {
                        ngram: ngram.into_boxed_slice(),
                        count: 1,
                    });
                    sketch.heap.push(Self::rank(h));
                }
            }
        }
        if nvisited < sketch.members.len() as u64 {
            return Err(SketchError::InvalidArgument(
                "nvisited cannot be smaller than the number of elements",
            ));
        }
        sketch.nvisited = nvisited;
        Ok(sketch)
    }

    /// Subword length.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Maximum number of hashes kept.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Seed forwarded to the hash function.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Identity of the hash function.
    pub fn hasher_id(&self) -> HasherId {
        self.hasher.id()
    }

    /// Number of subwords considered for admission so far.
    pub fn nvisited(&self) -> u64 {
        self.nvisited
    }

    /// Number of hashes currently admitted.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `h` is currently admitted.
    pub fn contains(&self, h: u64) -> bool {
        self.members.contains_key(&h)
    }

    /// Subword bytes behind an admitted hash; empty when the hash was
    /// ingested without one.
    pub fn ngram_of(&self, h: u64) -> Option<&[u8]> {
        self.members.get(&h).map(|member| &*member.ngram)
    }

    /// Admitted hashes in ascending order.
    pub fn sorted_hashes(&self) -> Vec<u64> {
        let mut hashes: Vec<u64> = self.members.keys().copied().collect();
        hashes.sort_unstable();
        hashes
    }

    /// Offer one candidate hash. `merging` suppresses count bookkeeping so
    /// that [`SetSketch::update`] can reconcile counts in a single pass
    /// afterwards.
    fn offer(&mut self, h: u64, ngram: &[u8], merging: bool) {
        let worst = self.heap.peek().map(|&rank| Self::rank(rank));
        match self.members.entry(h) {
            Slot::Occupied(mut slot) => {
                // Equal hashes never displace one another.
                if COUNT && !merging {
                    slot.get_mut().count += 1;
                }
            }
            Slot::Vacant(slot) => {
                let count = if merging { 0 } else { 1 };
                if self.heap.len() < self.max_size {
                    slot.insert(Member {
                        ngram: ngram.into(),
                        count,
                    });
                    self.heap.push(Self::rank(h));
                } else if worst.is_some_and(|worst| Self::better(h, worst)) {
                    slot.insert(Member {
                        ngram: ngram.into(),
                        count,
                    });
                    let Some(mut root) = self.heap.peek_mut() else {
                        return;
                    };
                    let evicted = Self::rank(*root);
                    *root = Self::rank(h);
                    drop(root); // sifts the new rank into place
                    self.members.remove(&evicted);
                }
            }
        }
    }

    /// Ingest every length-`k` subword of `seq` using a scratch buffer of
    /// [`DEFAULT_BUFFER_LEN`] hash slots.
    pub fn add(&mut self, seq: &[u8]) -> Result<()> {
        let mut buffer = vec![0u64; DEFAULT_BUFFER_LEN.max(self.k)];
        self.add_with_buffer(seq, &mut buffer)
    }

    /// Ingest every length-`k` subword of `seq`, reusing a caller-supplied
    /// hash buffer. The buffer length also sets the window width used to
    /// tile long sequences.
    ///
    /// # Errors
    /// [`SketchError::InvalidArgument`] when the buffer is shorter than `k`.
    pub fn add_with_buffer(&mut self, seq: &[u8], buffer: &mut [u64]) -> Result<()> {
        let hasher = Arc::clone(&self.hasher);
        for (begin, end) in chunk_windows(self.k, seq.len(), buffer.len())? {
            let window = &seq[begin..end];
            let n = hasher.hash_kmers(window, self.k, buffer, self.seed)?;
            for (j, &h) in buffer[..n].iter().enumerate() {
                self.offer(h, &window[j..j + self.k], false);
            }
            self.nvisited += n as u64;
        }
        Ok(())
    }

    /// Ingest raw hash values, with no subword behind them.
    ///
    /// `nvisited` is deliberately left untouched so that foreign samples can
    /// be folded in and the visit count transferred separately.
    pub fn add_hash_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = u64>,
    {
        for h in values {
            self.offer(h, &[], false);
        }
    }

    fn ensure_compatible(&self, other: &Self) -> Result<()> {
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
        if self.hasher.id() != other.hasher.id() {
            return Err(SketchError::IncompatibleSketch(format!(
                "hash function mismatch: {} vs {}",
                self.hasher.id(),
                other.hasher.id()
            )));
        }
        Ok(())
    }

    /// Fold another sketch into this one in place.
    ///
    /// The admitted set afterwards is what a single sketch would have
    /// admitted had it seen both inputs; counts become the per-hash sums of
    /// observations that survived on either side, and
    /// `nvisited` grows by `other.nvisited`.
    ///
    /// # Errors
    /// [`SketchError::IncompatibleSketch`] on mismatched `k`, seed or hash
    /// function. Polarity and counting cannot mismatch here: they are part
    /// of the type.
    pub fn update(&mut self, other: &Self) -> Result<()> {
        self.ensure_compatible(other)?;
        for (&h, member) in &other.members {
            self.offer(h, &member.ngram, true);
        }
        if COUNT {
            for (h, member) in self.members.iter_mut() {
                if let Some(theirs) = other.members.get(h) {
                    member.count += theirs.count;
                }
            }
        }
        self.nvisited += other.nvisited;
        Ok(())
    }

    /// Out-of-place merge: a fresh sketch configured like `a`, updated with
    /// `a` then `b`. `merge(&empty, &s)` reproduces `s`, and the result's
    /// `nvisited` is the sum of both sides'.
    pub fn merge(a: &Self, b: &Self) -> Result<Self> {
        let mut merged = Self::new(a.k, a.max_size, Arc::clone(&a.hasher), a.seed)?;
        merged.update(a)?;
        merged.update(b)?;
        Ok(merged)
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.heap.len(), self.members.len());
        assert!(self.members.len() <= self.max_size);
        assert!(self.nvisited >= self.members.len() as u64);
        let mut heap_hashes: Vec<u64> = self.heap.iter().map(|&rank| Self::rank(rank)).collect();
        heap_hashes.sort_unstable();
        assert_eq!(heap_hashes, self.sorted_hashes());
        if let Some(&root) = self.heap.peek() {
            let worst = Self::rank(root);
            for &h in self.members.keys() {
                assert!(!Self::better(worst, h), "root {worst:#x} beats {h:#x}");
            }
        }
        if COUNT {
            assert!(self.members.values().all(|member| member.count >= 1));
        }
    }
}

impl<const TOP: bool> SetSketch<TOP, false> {
    /// Immutable snapshot of the admitted hashes and configuration.
    pub fn freeze(&self) -> FrozenSketch {
        FrozenSketch::from_sketch(
            self.sorted_hashes(),
            self.k,
            self.max_size,
            self.nvisited,
            self.seed,
            self.hasher.id(),
        )
    }
}

impl<const TOP: bool> SetSketch<TOP, true> {
    /// Create a counting sketch preloaded with elements and their counts.
    ///
    /// # Errors
    /// As [`SetSketch::with_elements`]; additionally
    /// [`SketchError::DuplicateSeed`] when the key sets of `elements` and
    /// `counts` disagree, and [`SketchError::InvalidArgument`] on a count
    /// below 1.
    pub fn with_element_counts(
        k: usize,
        max_size: usize,
        hasher: Arc<dyn KmerHasher>,
        seed: u64,
        elements: Vec<(u64, Vec<u8>)>,
        counts: &HashMap<u64, u64>,
        nvisited: u64,
    ) -> Result<Self> {
        let mut sketch = Self::with_elements(k, max_size, hasher, seed, elements, nvisited)?;
        for (h, member) in sketch.members.iter_mut() {
            match counts.get(h) {
                Some(&count) if count >= 1 => member.count = count,
                Some(_) => {
                    return Err(SketchError::InvalidArgument("counts must be at least 1"));
                }
                None => return Err(SketchError::DuplicateSeed(*h)),
            }
        }
        if counts.len() != sketch.members.len() {
            let stray = counts
                .keys()
                .find(|h| !sketch.members.contains_key(h))
                .copied()
                .unwrap_or(0);
            return Err(SketchError::DuplicateSeed(stray));
        }
        Ok(sketch)
    }

    /// Number of times an admitted hash has been observed.
    pub fn count_of(&self, h: u64) -> Option<u64> {
        self.members.get(&h).map(|member| member.count)
    }

    /// Immutable snapshot including the per-hash counts.
    pub fn freeze(&self) -> FrozenCountSketch {
        let hashes = self.sorted_hashes();
        let counts = hashes
            .iter()
            .map(|h| self.members[h].count)
            .collect();
        FrozenCountSketch::from_sketch(
            hashes,
            counts,
            self.k,
            self.max_size,
            self.nvisited,
            self.seed,
            self.hasher.id(),
        )
    }
}

impl<const TOP: bool, const COUNT: bool> fmt::Debug for SetSketch<TOP, COUNT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(if TOP { "TopSketch" } else { "BottomSketch" })
            .field("k", &self.k)
            .field("max_size", &self.max_size)
            .field("seed", &self.seed)
            .field("hasher", &self.hasher.id())
            .field("len", &self.members.len())
            .field("nvisited", &self.nvisited)
            .finish_non_exhaustive()
    }
}

/// The operations the parallel driver needs from a sketch.
pub trait StreamSketch: Sized + Send {
    /// Ingest all length-`k` subwords of one sequence.
    fn add(&mut self, seq: &[u8]) -> Result<()>;
    /// Fold another sketch of the same shape into this one.
    fn update(&mut self, other: &Self) -> Result<()>;
}

impl<const TOP: bool, const COUNT: bool> StreamSketch for SetSketch<TOP, COUNT> {
    fn add(&mut self, seq: &[u8]) -> Result<()> {
        SetSketch::add(self, seq)
    }

    fn update(&mut self, other: &Self) -> Result<()> {
        SetSketch::update(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{DEFAULT_SEED, Murmur3Hasher, Xxh64Hasher};
    use rand::prelude::*;
    use std::collections::HashSet;

    fn murmur3() -> Arc<dyn KmerHasher> {
        Arc::new(Murmur3Hasher)
    }

    fn random_dna(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
    }

    fn all_hashes(seq: &[u8], k: usize, hasher: &dyn KmerHasher, seed: u64) -> Vec<u64> {
        let mut buffer = vec![0u64; seq.len() + 1];
        let n = hasher.hash_kmers(seq, k, &mut buffer, seed).unwrap();
        buffer.truncate(n);
        buffer
    }

    /// The `m` best distinct hashes, computed the slow way.
    fn expected_sample(hashes: &[u64], m: usize, top: bool) -> HashSet<u64> {
        let mut distinct: Vec<u64> = hashes.iter().copied().collect::<HashSet<_>>().into_iter().collect();
        distinct.sort_unstable();
        if top {
            distinct.reverse();
        }
        distinct.into_iter().take(m).collect()
    }

    fn check_add<const TOP: bool>(seq: &[u8], k: usize, m: usize, hasher: Arc<dyn KmerHasher>) {
        let seed = DEFAULT_SEED;
        let mut sketch: SetSketch<TOP, false> =
            SetSketch::new(k, m, Arc::clone(&hasher), seed).unwrap();
        sketch.add(seq).unwrap();
        sketch.assert_invariants();

        let hashes = all_hashes(seq, k, &*hasher, seed);
        assert_eq!(sketch.nvisited(), hashes.len() as u64);
        let expected = expected_sample(&hashes, m, TOP);
        assert_eq!(
            sketch.sorted_hashes().into_iter().collect::<HashSet<_>>(),
            expected
        );
    }

    #[test]
    fn add_keeps_the_extreme_hashes() {
        for (len, k, m) in [(250, 21, 10), (125, 21, 10), (125, 21, 200), (50, 3, 7)] {
            let seq = random_dna(len, 123);
            check_add::<true>(&seq, k, m, murmur3());
            check_add::<false>(&seq, k, m, murmur3());
            check_add::<true>(&seq, k, m, Arc::new(Xxh64Hasher));
            check_add::<false>(&seq, k, m, Arc::new(Xxh64Hasher));
        }
    }

    #[test]
    fn membership_of_known_kmer() {
        let mut sketch = TopSketch::new(3, 10, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add(b"AAABBBCCC").unwrap();
        assert_eq!(sketch.nvisited(), 7);
        assert_eq!(sketch.len(), 7);

        let mut one = [0u64; 1];
        Murmur3Hasher
            .hash_kmers(b"BBB", 3, &mut one, DEFAULT_SEED)
            .unwrap();
        assert!(sketch.contains(one[0]));
        assert_eq!(sketch.ngram_of(one[0]), Some(&b"BBB"[..]));
        assert!(!sketch.contains(123));
    }

    #[test]
    fn small_sample_keeps_only_the_extremum() {
        let seq = random_dna(100, 7);
        let hashes = all_hashes(&seq, 5, &Murmur3Hasher, DEFAULT_SEED);
        let mut top = TopSketch::new(5, 1, murmur3(), DEFAULT_SEED).unwrap();
        let mut bottom = BottomSketch::new(5, 1, murmur3(), DEFAULT_SEED).unwrap();
        top.add(&seq).unwrap();
        bottom.add(&seq).unwrap();
        assert_eq!(top.sorted_hashes(), vec![*hashes.iter().max().unwrap()]);
        assert_eq!(bottom.sorted_hashes(), vec![*hashes.iter().min().unwrap()]);
    }

    #[test]
    fn sequence_shorter_than_k_adds_nothing() {
        let mut sketch = BottomSketch::new(21, 10, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add(b"ACGT").unwrap();
        assert!(sketch.is_empty());
        assert_eq!(sketch.nvisited(), 0);
    }

    #[test]
    fn top_and_bottom_are_disjoint_on_a_long_stream() {
        let seq = random_dna(400, 99);
        let mut top = TopCountSketch::new(9, 20, murmur3(), DEFAULT_SEED).unwrap();
        let mut bottom = BottomCountSketch::new(9, 20, murmur3(), DEFAULT_SEED).unwrap();
        top.add(&seq).unwrap();
        bottom.add(&seq).unwrap();
        assert_eq!(top.len(), 20);
        assert_eq!(bottom.len(), 20);
        let top_set: HashSet<u64> = top.sorted_hashes().into_iter().collect();
        assert!(bottom.sorted_hashes().iter().all(|h| !top_set.contains(h)));
    }

    #[test]
    fn buffer_width_does_not_change_the_sample() {
        let seq = random_dna(250, 123);
        let k = 21;
        let mut wide = TopSketch::new(k, 10, murmur3(), DEFAULT_SEED).unwrap();
        let mut narrow = TopSketch::new(k, 10, murmur3(), DEFAULT_SEED).unwrap();
        wide.add(&seq).unwrap();
        let mut buffer = vec![0u64; 30];
        narrow.add_with_buffer(&seq, &mut buffer).unwrap();
        narrow.assert_invariants();
        assert_eq!(wide.sorted_hashes(), narrow.sorted_hashes());
        assert_eq!(wide.nvisited(), narrow.nvisited());
    }

    #[test]
    fn buffer_shorter_than_k_is_rejected() {
        let mut sketch = TopSketch::new(21, 10, murmur3(), DEFAULT_SEED).unwrap();
        let mut buffer = vec![0u64; 20];
        assert!(matches!(
            sketch.add_with_buffer(b"ACGT", &mut buffer),
            Err(SketchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn halves_update_to_the_whole() {
        let seq = random_dna(300, 5);
        let k = 7;
        // Overlap the halves by k-1 bytes so no boundary k-mer is lost.
        let mut a = BottomSketch::new(k, 24, murmur3(), DEFAULT_SEED).unwrap();
        let mut b = BottomSketch::new(k, 24, murmur3(), DEFAULT_SEED).unwrap();
        a.add(&seq[..150]).unwrap();
        b.add(&seq[150 - (k - 1)..]).unwrap();

        let mut whole = BottomSketch::new(k, 24, murmur3(), DEFAULT_SEED).unwrap();
        whole.add(&seq).unwrap();

        a.update(&b).unwrap();
        a.assert_invariants();
        assert_eq!(a.sorted_hashes(), whole.sorted_hashes());
        assert_eq!(a.nvisited(), whole.nvisited());
    }

    #[test]
    fn update_rejects_mismatched_configuration() {
        let base = TopSketch::new(3, 10, murmur3(), DEFAULT_SEED).unwrap();
        let other_k = TopSketch::new(4, 10, murmur3(), DEFAULT_SEED).unwrap();
        let other_seed = TopSketch::new(3, 10, murmur3(), 7).unwrap();
        let other_fun = TopSketch::new(3, 10, Arc::new(Xxh64Hasher), DEFAULT_SEED).unwrap();
        let mut sketch = base.clone();
        assert!(sketch.update(&other_k).is_err());
        assert!(sketch.update(&other_seed).is_err());
        assert!(sketch.update(&other_fun).is_err());
    }

    #[test]
    fn merge_is_commutative_and_sums_nvisited() {
        let a_seq = random_dna(200, 1);
        let b_seq = random_dna(200, 2);
        let mut a = TopSketch::new(9, 15, murmur3(), DEFAULT_SEED).unwrap();
        let mut b = TopSketch::new(9, 15, murmur3(), DEFAULT_SEED).unwrap();
        a.add(&a_seq).unwrap();
        b.add(&b_seq).unwrap();

        let ab = SetSketch::merge(&a, &b).unwrap();
        let ba = SetSketch::merge(&b, &a).unwrap();
        ab.assert_invariants();
        assert_eq!(ab.sorted_hashes(), ba.sorted_hashes());
        assert_eq!(ab.nvisited(), a.nvisited() + b.nvisited());

        let empty = TopSketch::new(9, 15, murmur3(), DEFAULT_SEED).unwrap();
        let same = SetSketch::merge(&empty, &a).unwrap();
        assert_eq!(same.sorted_hashes(), a.sorted_hashes());
        assert_eq!(same.nvisited(), a.nvisited());
    }

    #[test]
    fn counts_track_multiplicity() {
        // "AA" occurs at offsets 0, 1 and 2 of "AAAA".
        let mut sketch = TopCountSketch::new(2, 10, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add(b"AAAA").unwrap();
        sketch.assert_invariants();
        assert_eq!(sketch.len(), 1);
        assert_eq!(sketch.nvisited(), 3);
        let h = sketch.sorted_hashes()[0];
        assert_eq!(sketch.count_of(h), Some(3));
    }

    #[test]
    fn replacement_drops_the_evicted_count() {
        let seq = random_dna(500, 11);
        let k = 9;
        let mut sketch = BottomCountSketch::new(k, 5, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add(&seq).unwrap();
        sketch.add(&seq).unwrap();
        sketch.assert_invariants();
        // Every admitted hash was seen in both passes.
        for h in sketch.sorted_hashes() {
            assert!(sketch.count_of(h).unwrap() >= 2);
        }
    }

    #[test]
    fn count_update_adds_surviving_observations() {
        let seq = random_dna(200, 21);
        let mut a = BottomCountSketch::new(7, 12, murmur3(), DEFAULT_SEED).unwrap();
        let mut b = BottomCountSketch::new(7, 12, murmur3(), DEFAULT_SEED).unwrap();
        a.add(&seq).unwrap();
        b.add(&seq).unwrap();

        let mut doubled = a.clone();
        doubled.update(&b).unwrap();
        doubled.assert_invariants();
        assert_eq!(doubled.sorted_hashes(), a.sorted_hashes());
        for h in a.sorted_hashes() {
            assert_eq!(doubled.count_of(h), Some(2 * a.count_of(h).unwrap()));
        }
        assert_eq!(doubled.nvisited(), 2 * a.nvisited());
    }

    #[test]
    fn add_hash_values_keeps_the_sample_property() {
        let mut sketch = TopSketch::new(3, 4, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add_hash_values([5, 1, 9, 7, 3, 8, 2]);
        sketch.assert_invariants();
        assert_eq!(sketch.sorted_hashes(), vec![5, 7, 8, 9]);
        assert_eq!(sketch.nvisited(), 0);

        let mut bottom = BottomSketch::new(3, 4, murmur3(), DEFAULT_SEED).unwrap();
        bottom.add_hash_values([5, 1, 9, 7, 3, 8, 2]);
        assert_eq!(bottom.sorted_hashes(), vec![1, 2, 3, 5]);
    }

    #[test]
    fn hash_value_duplicates_collapse_and_count() {
        let mut sketch = TopCountSketch::new(3, 4, murmur3(), DEFAULT_SEED).unwrap();
        sketch.add_hash_values([9, 9, 9, 1]);
        sketch.assert_invariants();
        assert_eq!(sketch.len(), 2);
        assert_eq!(sketch.count_of(9), Some(3));
        assert_eq!(sketch.count_of(1), Some(1));
    }

    #[test]
    fn preload_rejects_duplicates() {
        let elements = vec![(7u64, b"ACG".to_vec()), (7u64, b"CGT".to_vec())];
        let err = TopSketch::with_elements(3, 10, murmur3(), DEFAULT_SEED, elements, 2)
            .unwrap_err();
        assert!(matches!(err, SketchError::DuplicateSeed(7)));
    }

    #[test]
    fn preload_validates_nvisited_and_size() {
        let elements = vec![(1u64, vec![]), (2u64, vec![])];
        assert!(matches!(
            TopSketch::with_elements(3, 10, murmur3(), DEFAULT_SEED, elements.clone(), 1),
            Err(SketchError::InvalidArgument(_))
        ));
        assert!(matches!(
            TopSketch::with_elements(3, 1, murmur3(), DEFAULT_SEED, elements, 2),
            Err(SketchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn preload_counts_must_agree_with_the_heap() {
        let elements = vec![(1u64, vec![]), (2u64, vec![])];
        let counts: HashMap<u64, u64> = [(1, 2), (2, 1)].into_iter().collect();
        let sketch = TopCountSketch::with_element_counts(
            3,
            10,
            murmur3(),
            DEFAULT_SEED,
            elements.clone(),
            &counts,
            5,
        )
        .unwrap();
        assert_eq!(sketch.count_of(1), Some(2));

        let missing: HashMap<u64, u64> = [(1, 2)].into_iter().collect();
        assert!(matches!(
            TopCountSketch::with_element_counts(
                3,
                10,
                murmur3(),
                DEFAULT_SEED,
                elements.clone(),
                &missing,
                5
            ),
            Err(SketchError::DuplicateSeed(2))
        ));

        let stray: HashMap<u64, u64> = [(1, 2), (2, 1), (3, 1)].into_iter().collect();
        assert!(matches!(
            TopCountSketch::with_element_counts(
                3,
                10,
                murmur3(),
                DEFAULT_SEED,
                elements,
                &stray,
                5
            ),
            Err(SketchError::DuplicateSeed(3))
        ));
    }

    #[test]
    fn freeze_projects_the_admitted_set() {
        let seq = random_dna(120, 3);
        let mut plain = TopSketch::new(5, 12, murmur3(), DEFAULT_SEED).unwrap();
        plain.add(&seq).unwrap();
        let frozen = plain.freeze();
        assert_eq!(frozen.hashes(), plain.sorted_hashes());
        assert_eq!(frozen.k(), plain.k());
        assert_eq!(frozen.max_size(), plain.max_size());
        assert_eq!(frozen.nvisited(), plain.nvisited());
        assert_eq!(frozen.seed(), plain.seed());
        assert_eq!(frozen.hasher_id(), plain.hasher_id());

        let mut counting = BottomCountSketch::new(5, 12, murmur3(), DEFAULT_SEED).unwrap();
        counting.add(&seq).unwrap();
        let frozen = counting.freeze();
        assert_eq!(frozen.hashes(), counting.sorted_hashes());
        for (&h, &count) in frozen.hashes().iter().zip(frozen.counts()) {
            assert_eq!(counting.count_of(h), Some(count));
        }
    }

    #[test]
    fn rejects_zero_parameters() {
        assert!(TopSketch::new(0, 10, murmur3(), 0).is_err());
        assert!(TopSketch::new(3, 0, murmur3(), 0).is_err());
    }
}
