//! MASH-compatible canonical k-mer hashing.
//!
//! DNA reads come from either strand, so a strand-agnostic sketch hashes the
//! lexicographically smaller of a k-mer and its reverse complement. Bytes
//! outside `{A, C, G, T}` are masked to `N` first, which keeps ambiguous
//! bases from matching anything on the opposite strand.

use crate::error::Result;
use crate::hash::{HasherId, KmerHasher, kmer_count};

const fn complement_table() -> [u8; 256] {
    let mut table = [b'N'; 256];
    table[b'A' as usize] = b'T';
    table[b'T' as usize] = b'A';
    table[b'G' as usize] = b'C';
    table[b'C' as usize] = b'G';
    table[b'N' as usize] = b'N';
    table
}

const fn mask_table() -> [u8; 256] {
    let mut table = [b'N'; 256];
    table[b'A' as usize] = b'A';
    table[b'C' as usize] = b'C';
    table[b'G' as usize] = b'G';
    table[b'T' as usize] = b'T';
    table
}

const COMPLEMENT: [u8; 256] = complement_table();
const MASK_ACGT: [u8; 256] = mask_table();

/// Reverse complement of a DNA sequence. Bytes outside `{A, C, G, T, N}`
/// complement to `N`.
pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| COMPLEMENT[b as usize])
        .collect()
}

/// Canonical k-mer hasher: MurmurHash3 x64_128 (lower 64 bits) of
/// `min(kmer, revcomp(kmer))`, matching what MASH and sourmash compute with
/// [`crate::hash::DEFAULT_SEED`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MashHasher;

impl KmerHasher for MashHasher {
    fn id(&self) -> HasherId {
        HasherId::MashMurmur3
    }

    fn hash_kmers(&self, seq: &[u8], k: usize, out: &mut [u64], seed: u64) -> Result<usize> {
        let n = kmer_count(seq, k, out.len())?;
        if n == 0 {
            return Ok(0);
        }
        let masked: Vec<u8> = seq.iter().map(|&b| MASK_ACGT[b as usize]).collect();
        let rc = revcomp(&masked);
        let len = masked.len();
        for (i, slot) in out[..n].iter_mut().enumerate() {
            let fwd = &masked[i..i + k];
            let rev = &rc[len - i - k..len - i];
            let canonical = if fwd <= rev { fwd } else { rev };
            *slot = murmurhash3::murmurhash3_x64_128(canonical, seed).0;
        }
        Ok(n)
    }
}
