use ahash::AHashSet;

use super::{ApproxSet, FilterParams};

/// Exact k-mer set implementing [`ApproxSet`] with a zero false-positive rate.
///
/// Sizing parameters only pre-allocate capacity. Useful when exact per-reference
/// answers are worth the memory, and as a deterministic stand-in for tests.
#[derive(Debug, Clone, Default)]
pub struct ExactSet {
    kmers: AHashSet<Vec<u8>>,
    items: usize,
}

impl ExactSet {
    /// Number of distinct k-mers held
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.kmers.len()
    }
}

impl ApproxSet for ExactSet {
    fn with_params(params: &FilterParams) -> Self {
        Self {
            kmers: AHashSet::with_capacity(params.expected_items),
            items: 0,
        }
    }

    fn insert(&mut self, kmer: &[u8]) {
        if !self.kmers.contains(kmer) {
            self.kmers.insert(kmer.to_vec());
        }
        self.items += 1;
    }

    fn contains(&self, kmer: &[u8]) -> bool {
        self.kmers.contains(kmer)
    }

    fn item_count(&self) -> usize {
        self.items
    }

    fn size_bits(&self) -> usize {
        self.kmers.iter().map(|kmer| kmer.len() * 8).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::optimal_size;

    #[test]
    fn test_exact_set_has_no_false_positives() {
        let mut set = ExactSet::with_params(&optimal_size(2, 0.5));
        set.insert(b"AAAA");
        set.insert(b"AAAA");
        set.insert(b"CCCC");

        assert!(set.contains(b"AAAA"));
        assert!(set.contains(b"CCCC"));
        assert!(!set.contains(b"GGGG"));
        assert_eq!(set.item_count(), 3);
        assert_eq!(set.distinct(), 2);
        assert_eq!(set.size_bits(), 64);
    }

    #[test]
    fn test_from_kmers() {
        let kmers: [&[u8]; 2] = [b"ACGT", b"TGCA"];
        let set = ExactSet::from_kmers(kmers, 2, 0.001);
        assert!(set.contains(b"ACGT"));
        assert!(set.contains(b"TGCA"));
        assert!(!set.contains(b"AAAA"));
    }
}
