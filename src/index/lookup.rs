use ahash::AHashSet;

use crate::core::sketch::ReferenceSketch;

/// Exact set of every k-mer in every reference sketch.
///
/// Consulted before the tree walk: most k-mers in a read belong to no reference,
/// and a single hash lookup rules them out without touching any filter. The set
/// borrows the k-mer bytes from the sketches rather than copying them.
#[derive(Debug, Clone, Default)]
pub struct FastLookupIndex<'a> {
    kmers: AHashSet<&'a [u8]>,
}

impl<'a> FastLookupIndex<'a> {
    /// Insert every non-empty k-mer of every sketch
    pub fn build(sketches: &'a [ReferenceSketch]) -> Self {
        let capacity = sketches.iter().map(|s| s.kmers.len()).sum();
        let mut kmers = AHashSet::with_capacity(capacity);
        for sketch in sketches {
            kmers.extend(sketch.usable_kmers());
        }
        Self { kmers }
    }

    /// Exact membership test
    pub fn contains(&self, kmer: &[u8]) -> bool {
        self.kmers.contains(kmer)
    }

    /// Number of distinct k-mers
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }
}
