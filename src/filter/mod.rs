//! Approximate-membership sets over k-mers.
//!
//! The classification tree only needs three things from a node filter: build
//! one sized for an expected number of items, insert a k-mer, and test a k-mer.
//! [`ApproxSet`] captures exactly that, so backends can be swapped without
//! touching the tree logic.
//!
//! - [`BloomFilter`]: the production backend, a bit vector with double hashing
//! - [`ExactSet`]: a hash set with no false positives, used when exact answers
//!   matter more than memory (and throughout the tests)
//!
//! ## Sizing
//!
//! [`optimal_size`] is a pure function of the expected item count and target
//! false-positive rate `p`:
//!
//! ```text
//! bits   = ceil(-n * ln(p) / ln(2)^2)
//! hashes = round(bits / n * ln(2))
//! ```
//!
//! ## Example
//!
//! ```rust
//! use kmer_tally::filter::{optimal_size, ApproxSet, BloomFilter};
//!
//! let params = optimal_size(2, 0.001);
//! let mut filter = BloomFilter::with_params(&params);
//! filter.insert(b"ACGT");
//! filter.insert(b"TTTT");
//!
//! assert!(filter.contains(b"ACGT"));
//! ```

pub mod bloom;
pub mod exact;

pub use bloom::BloomFilter;
pub use exact::ExactSet;

/// Smallest filter allocated, in bits
pub const MIN_FILTER_BITS: usize = 64;

/// Upper bound on hash functions per item
pub const MAX_HASHES: u32 = 32;

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Allocation parameters for an approximate-membership set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    /// Number of items the filter was sized for
    pub expected_items: usize,
    /// Size of the bit vector
    pub num_bits: usize,
    /// Number of hash functions applied per item
    pub num_hashes: u32,
}

/// Compute bloom filter dimensions for `n_items` at the target `fp_rate`.
///
/// An empty filter still gets `MIN_FILTER_BITS` bits and one hash function so
/// every node in the tree owns a valid (if never matching) filter. `fp_rate`
/// is expected in `(0, 1)`; callers validate it up front.
#[must_use]
pub fn optimal_size(n_items: usize, fp_rate: f64) -> FilterParams {
    if n_items == 0 {
        return FilterParams {
            expected_items: 0,
            num_bits: MIN_FILTER_BITS,
            num_hashes: 1,
        };
    }

    let n = count_to_f64(n_items);
    let ln2 = std::f64::consts::LN_2;
    let bits = (-n * fp_rate.ln() / (ln2 * ln2)).ceil();
    let hashes = (bits / n * ln2).round();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Both are positive and bounded
    let (num_bits, num_hashes) = (bits as usize, hashes as u32);

    FilterParams {
        expected_items: n_items,
        num_bits: num_bits.max(MIN_FILTER_BITS),
        num_hashes: num_hashes.clamp(1, MAX_HASHES),
    }
}

/// Approximate-membership set over fixed-length k-mers.
///
/// Implementations may report false positives from `contains` but never false
/// negatives: every inserted k-mer must test positive afterwards.
pub trait ApproxSet: Send + Sync {
    /// Allocate an empty set for the given parameters
    fn with_params(params: &FilterParams) -> Self
    where
        Self: Sized;

    /// Add a k-mer
    fn insert(&mut self, kmer: &[u8]);

    /// Test a k-mer
    fn contains(&self, kmer: &[u8]) -> bool;

    /// Number of insertions performed
    fn item_count(&self) -> usize;

    /// Approximate memory footprint in bits
    fn size_bits(&self) -> usize;

    /// Build a set holding every k-mer yielded by `kmers`, sized for `n_items`
    fn from_kmers<'k, I>(kmers: I, n_items: usize, fp_rate: f64) -> Self
    where
        Self: Sized,
        I: IntoIterator<Item = &'k [u8]>,
    {
        let mut set = Self::with_params(&optimal_size(n_items, fp_rate));
        for kmer in kmers {
            set.insert(kmer);
        }
        set
    }
}
