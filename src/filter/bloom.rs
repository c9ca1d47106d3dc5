//! Bit-vector bloom filter for k-mer membership.
//!
//! Bit positions come from Kirsch-Mitzenmacher double hashing: two xxh3 hashes
//! with fixed seeds, combined as `h1 + i * h2` for the i-th probe. Fixed seeds
//! make the filter deterministic, so the same k-mers always produce the same
//! bits (and the same false positives) from run to run.

use xxhash_rust::xxh3::xxh3_64_with_seed;

use super::{count_to_f64, ApproxSet, FilterParams, MIN_FILTER_BITS};

const SEED_PRIMARY: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_SECONDARY: u64 = 0xbf58_476d_1ce4_e5b9;

/// Bloom filter over byte-string k-mers
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: u32,
    items: usize,
}

impl BloomFilter {
    /// Create an empty filter with `num_bits` bits and `num_hashes` probes per item
    #[must_use]
    pub fn new(num_bits: usize, num_hashes: u32) -> Self {
        let num_bits = num_bits.max(MIN_FILTER_BITS);
        Self {
            bits: vec![0u64; num_bits.div_ceil(64)],
            num_bits,
            num_hashes: num_hashes.max(1),
            items: 0,
        }
    }

    /// Number of hash functions applied per item
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Fraction of bits set
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        let set: u32 = self.bits.iter().map(|word| word.count_ones()).sum();
        f64::from(set) / count_to_f64(self.num_bits)
    }

    /// Expected false-positive rate given the current number of insertions
    #[must_use]
    pub fn estimated_fp_rate(&self) -> f64 {
        let k = f64::from(self.num_hashes);
        let exponent = -k * count_to_f64(self.items) / count_to_f64(self.num_bits);
        (1.0 - exponent.exp()).powf(k)
    }

    #[inline]
    fn hash_pair(kmer: &[u8]) -> (u64, u64) {
        (
            xxh3_64_with_seed(kmer, SEED_PRIMARY),
            xxh3_64_with_seed(kmer, SEED_SECONDARY) | 1,
        )
    }

    /// Bit probed by the i-th hash function
    #[inline]
    fn probe(&self, h1: u64, h2: u64, i: u32) -> usize {
        let position = h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % self.num_bits as u64;
        #[allow(clippy::cast_possible_truncation)] // Reduced modulo num_bits
        {
            position as usize
        }
    }
}

impl ApproxSet for BloomFilter {
    fn with_params(params: &FilterParams) -> Self {
        Self::new(params.num_bits, params.num_hashes)
    }

    fn insert(&mut self, kmer: &[u8]) {
        let (h1, h2) = Self::hash_pair(kmer);
        for i in 0..self.num_hashes {
            let bit = self.probe(h1, h2, i);
            self.bits[bit / 64] |= 1u64 << (bit % 64);
        }
        self.items += 1;
    }

    fn contains(&self, kmer: &[u8]) -> bool {
        let (h1, h2) = Self::hash_pair(kmer);
        (0..self.num_hashes).all(|i| {
            let bit = self.probe(h1, h2, i);
            self.bits[bit / 64] & (1u64 << (bit % 64)) != 0
        })
    }

    fn item_count(&self) -> usize {
        self.items
    }

    fn size_bits(&self) -> usize {
        self.num_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::optimal_size;

    fn kmer_for(i: usize) -> Vec<u8> {
        // Spell i in base 4 over ACGT, 12 characters wide
        let mut n = i;
        (0..12)
            .map(|_| {
                let base = b"ACGT"[n % 4];
                n /= 4;
                base
            })
            .collect()
    }

    #[test]
    fn test_bloom_filter_basic() {
        let mut bloom = BloomFilter::new(1024, 3);

        bloom.insert(b"ACGTACGT");
        bloom.insert(b"TTTTAAAA");

        assert!(bloom.contains(b"ACGTACGT"));
        assert!(bloom.contains(b"TTTTAAAA"));
        assert_eq!(bloom.item_count(), 2);
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let bloom = BloomFilter::with_params(&optimal_size(0, 0.001));
        assert!(!bloom.contains(b"ACGT"));
        assert!(!bloom.contains(b""));
        assert_eq!(bloom.fill_ratio(), 0.0);
    }

    #[test]
    fn test_no_false_negatives() {
        let n = 5_000;
        let mut bloom = BloomFilter::with_params(&optimal_size(n, 0.001));
        for i in 0..n {
            bloom.insert(&kmer_for(i));
        }
        for i in 0..n {
            assert!(bloom.contains(&kmer_for(i)), "missing k-mer {i}");
        }
    }

    #[test]
    fn test_false_positive_rate_near_target() {
        let n = 5_000;
        let mut bloom = BloomFilter::with_params(&optimal_size(n, 0.01));
        for i in 0..n {
            bloom.insert(&kmer_for(i));
        }

        let trials = 20_000;
        let false_positives = (n..n + trials)
            .filter(|&i| bloom.contains(&kmer_for(i)))
            .count();
        let observed = count_to_f64(false_positives) / count_to_f64(trials);

        // Generous bound: target is 1%
        assert!(observed < 0.03, "observed fp rate {observed}");
        assert!(bloom.estimated_fp_rate() < 0.02);
    }

    #[test]
    fn test_minimum_size_enforced() {
        let bloom = BloomFilter::new(1, 0);
        assert_eq!(bloom.size_bits(), MIN_FILTER_BITS);
        assert_eq!(bloom.num_hashes(), 1);
    }

    #[test]
    fn test_deterministic_bits() {
        let mut a = BloomFilter::new(4096, 5);
        let mut b = BloomFilter::new(4096, 5);
        for i in 0..100 {
            a.insert(&kmer_for(i));
            b.insert(&kmer_for(i));
        }
        assert_eq!(a.bits, b.bits);
    }
}
