//! Reference index: the read-only structures shared by every classification worker.
//!
//! [`ReferenceIndex`] bundles the reference sketches with the two lookup
//! structures built from them:
//!
//! - [`FastLookupIndex`]: exact set of every reference k-mer, consulted first
//! - [`ClassificationTree`]: filter tree resolving a k-mer to candidate references
//!
//! The index is built once, validated up front, and then only read. Workers
//! share it by plain reference.

pub mod lookup;
pub mod tree;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::sketch::ReferenceSketch;
use crate::core::types::ClassifierConfig;
use crate::filter::{ApproxSet, BloomFilter};
use crate::utils::validation::{validate_kmer_size, ValidationError};

pub use lookup::FastLookupIndex;
pub use tree::{ClassificationTree, LevelStats, NodeKind, TreeNode};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("No reference sketches supplied")]
    EmptyReferenceSet,

    #[error("Sketch '{name}' has k-mer size {found}, expected {expected}")]
    InconsistentKmerSize {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Sketch '{name}' contains a k-mer of length {found}, expected {expected}")]
    KmerLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Sketch '{name}' at position {position} carries index {index}")]
    SketchIndexMismatch {
        name: String,
        position: usize,
        index: usize,
    },

    #[error("Sketch index {index} out of range for {len} sketches")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// Immutable bundle of reference sketches, fast lookup set and classification tree
#[derive(Debug)]
pub struct ReferenceIndex<'a, F = BloomFilter> {
    sketches: &'a [ReferenceSketch],
    ksize: usize,
    fp_rate: f64,
    fast_index: FastLookupIndex<'a>,
    tree: ClassificationTree<F>,
}

impl<'a, F: ApproxSet> ReferenceIndex<'a, F> {
    /// Validate `sketches` against `config` and build both lookup structures.
    ///
    /// Sketches must be non-empty, share one k-mer size (equal to
    /// `config.ksize` when set), carry their own position as `index`, and
    /// hold only k-mers of that size (empty placeholders aside).
    ///
    /// # Errors
    ///
    /// Returns `IndexError` describing the first violated requirement.
    pub fn build(
        sketches: &'a [ReferenceSketch],
        config: &ClassifierConfig,
    ) -> Result<Self, IndexError> {
        config.validate()?;

        let first = sketches.first().ok_or(IndexError::EmptyReferenceSet)?;
        let ksize = validate_kmer_size(config.ksize.unwrap_or(first.ksize))?;

        for (position, sketch) in sketches.iter().enumerate() {
            if sketch.index != position {
                return Err(IndexError::SketchIndexMismatch {
                    name: sketch.source_name.clone(),
                    position,
                    index: sketch.index,
                });
            }
            if sketch.ksize != ksize {
                return Err(IndexError::InconsistentKmerSize {
                    name: sketch.source_name.clone(),
                    expected: ksize,
                    found: sketch.ksize,
                });
            }
            if let Some(kmer) = sketch.find_mislength_kmer() {
                return Err(IndexError::KmerLengthMismatch {
                    name: sketch.source_name.clone(),
                    expected: ksize,
                    found: kmer.len(),
                });
            }
            if sketch.usable_len() == 0 {
                warn!(
                    "Reference '{}' has no usable {ksize}-mers and will never be matched",
                    sketch.source_name
                );
            }
        }

        let fast_index = FastLookupIndex::build(sketches);
        let tree = ClassificationTree::from_sketches(sketches, config.fp_rate)?;

        info!(
            "Indexed {} references: k={ksize}, {} distinct k-mers, tree depth {}",
            sketches.len(),
            fast_index.len(),
            tree.depth()
        );

        Ok(Self {
            sketches,
            ksize,
            fp_rate: config.fp_rate,
            fast_index,
            tree,
        })
    }

    /// Resolve one k-mer, calling `on_match` for every candidate reference.
    ///
    /// Returns `false` when the exact pre-filter rules the k-mer out, in which
    /// case the tree is not consulted.
    pub fn classify_kmer(&self, kmer: &[u8], on_match: impl FnMut(usize)) -> bool {
        if !self.fast_index.contains(kmer) {
            return false;
        }
        self.tree.visit_matches(kmer, on_match);
        true
    }

    /// Candidate references for `kmer` (pre-filter, then tree)
    pub fn query(&self, kmer: &[u8]) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        self.classify_kmer(kmer, |index| {
            result.insert(index);
        });
        result
    }
}

impl<'a, F> ReferenceIndex<'a, F> {
    pub fn sketches(&self) -> &'a [ReferenceSketch] {
        self.sketches
    }

    /// K-mer size shared by every reference
    pub fn ksize(&self) -> usize {
        self.ksize
    }

    /// False-positive rate the node filters were sized for
    pub fn fp_rate(&self) -> f64 {
        self.fp_rate
    }

    pub fn fast_index(&self) -> &FastLookupIndex<'a> {
        &self.fast_index
    }

    pub fn tree(&self) -> &ClassificationTree<F> {
        &self.tree
    }

    /// Number of references
    pub fn len(&self) -> usize {
        self.sketches.len()
    }

    /// Always false once built: `build` rejects an empty reference set
    pub fn is_empty(&self) -> bool {
        self.sketches.is_empty()
    }

    /// Display name of the reference at `index`
    pub fn source_name(&self, index: usize) -> Option<&'a str> {
        self.sketches.get(index).map(|s| s.source_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExactSet;
    use crate::utils::validation::MAX_KMER_SIZE;

    fn sketch(index: usize, ksize: usize, kmers: &[&str]) -> ReferenceSketch {
        ReferenceSketch::new(
            index,
            format!("ref{index}"),
            ksize,
            kmers.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig::default().with_workers(1)
    }

    #[test]
    fn test_build_and_query() {
        let sketches = vec![
            sketch(0, 4, &["AAAA", "AAAC"]),
            sketch(1, 4, &["CCCC"]),
            sketch(2, 4, &["GGGG", "AAAA"]),
        ];
        let index = ReferenceIndex::<ExactSet>::build(&sketches, &config()).unwrap();

        assert_eq!(index.ksize(), 4);
        assert_eq!(index.len(), 3);
        assert_eq!(index.fast_index().len(), 4);
        assert_eq!(index.query(b"AAAA"), BTreeSet::from([0, 2]));
        assert_eq!(index.query(b"CCCC"), BTreeSet::from([1]));
        assert!(index.query(b"TTTT").is_empty());
        assert_eq!(index.source_name(1), Some("ref1"));
        assert_eq!(index.source_name(3), None);
    }

    #[test]
    fn test_prefilter_short_circuits() {
        let sketches = vec![sketch(0, 4, &["AAAA"])];
        let index = ReferenceIndex::<BloomFilter>::build(&sketches, &config()).unwrap();

        let mut calls = 0;
        assert!(!index.classify_kmer(b"TTTT", |_| calls += 1));
        assert_eq!(calls, 0);
        assert!(index.classify_kmer(b"AAAA", |_| calls += 1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_built_index_is_never_empty() {
        let sketches = vec![sketch(0, 4, &[""])];
        let index = ReferenceIndex::<ExactSet>::build(&sketches, &config()).unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
        assert_eq!(index.tree().len(), 1);
        assert!(!index.tree().is_empty());
        assert!(index.fast_index().is_empty());
    }

    #[test]
    fn test_empty_reference_set_rejected() {
        let result = ReferenceIndex::<BloomFilter>::build(&[], &config());
        assert!(matches!(result, Err(IndexError::EmptyReferenceSet)));
    }

    #[test]
    fn test_inconsistent_ksize_rejected() {
        let sketches = vec![sketch(0, 4, &["AAAA"]), sketch(1, 5, &["CCCCC"])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config());
        assert!(matches!(
            result,
            Err(IndexError::InconsistentKmerSize {
                expected: 4,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_configured_ksize_must_match() {
        let sketches = vec![sketch(0, 4, &["AAAA"])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config().with_ksize(5));
        assert!(matches!(
            result,
            Err(IndexError::InconsistentKmerSize {
                expected: 5,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_sketch_ksize_out_of_range_rejected() {
        let sketches = vec![sketch(0, 0, &[""])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config());
        assert!(matches!(
            result,
            Err(IndexError::InvalidConfig(ValidationError::InvalidKmerSize(0)))
        ));

        let too_long = "A".repeat(MAX_KMER_SIZE + 1);
        let sketches = vec![sketch(0, MAX_KMER_SIZE + 1, &[too_long.as_str()])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config());
        assert!(matches!(
            result,
            Err(IndexError::InvalidConfig(ValidationError::InvalidKmerSize(k))) if k == MAX_KMER_SIZE + 1
        ));
    }

    #[test]
    fn test_mislength_kmer_rejected() {
        let sketches = vec![sketch(0, 4, &["AAAA", "AAA"])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config());
        assert!(matches!(
            result,
            Err(IndexError::KmerLengthMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_index_must_match_position() {
        let sketches = vec![sketch(0, 4, &["AAAA"]), sketch(5, 4, &["CCCC"])];
        let result = ReferenceIndex::<BloomFilter>::build(&sketches, &config());
        assert!(matches!(
            result,
            Err(IndexError::SketchIndexMismatch {
                position: 1,
                index: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sketches = vec![sketch(0, 4, &["AAAA"])];
        let result =
            ReferenceIndex::<BloomFilter>::build(&sketches, &config().with_fp_rate(0.0));
        assert!(matches!(result, Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn test_sketch_without_kmers_accepted() {
        let sketches = vec![sketch(0, 4, &["AAAA"]), sketch(1, 4, &[""])];
        let index = ReferenceIndex::<BloomFilter>::build(&sketches, &config()).unwrap();
        assert_eq!(index.query(b"AAAA"), BTreeSet::from([0]));
    }
}
