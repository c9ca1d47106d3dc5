//! Property tests for the classification tree and the reference index
//!
//! These exercise the guarantees the pipeline depends on: no false negatives,
//! every reference reachable exactly once, deterministic layout, and a sound
//! exact pre-filter.

use std::collections::BTreeSet;

use kmer_tally::filter::{BloomFilter, ExactSet};
use kmer_tally::index::{ClassificationTree, ReferenceIndex};
use kmer_tally::{ClassifierConfig, ReferenceSketch};

/// Deterministic pseudo-random k-mer generator (xorshift)
fn random_kmers(seed: u64, count: usize, k: usize) -> Vec<String> {
    let mut state = seed.wrapping_mul(0x2545_f491_4f6c_dd1d) | 1;
    (0..count)
        .map(|_| {
            (0..k)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    char::from(b"ACGT"[(state % 4) as usize])
                })
                .collect()
        })
        .collect()
}

fn random_sketches(n: usize, per_sketch: usize, k: usize) -> Vec<ReferenceSketch> {
    (0..n)
        .map(|i| {
            ReferenceSketch::new(
                i,
                format!("genome_{i}"),
                k,
                random_kmers(i as u64 + 1, per_sketch, k),
            )
        })
        .collect()
}

#[test]
fn test_no_false_negatives_with_bloom_filters() {
    let sketches = random_sketches(37, 200, 15);
    let tree = ClassificationTree::<BloomFilter>::from_sketches(&sketches, 0.001).unwrap();

    for sketch in &sketches {
        for kmer in sketch.usable_kmers() {
            assert!(
                tree.query(kmer).contains(&sketch.index),
                "k-mer {} of {} not found",
                String::from_utf8_lossy(kmer),
                sketch.source_name
            );
        }
    }
}

#[test]
fn test_every_reference_is_exactly_one_leaf() {
    for n in [1, 2, 3, 7, 8, 33] {
        let sketches = random_sketches(n, 5, 11);
        let tree = ClassificationTree::<BloomFilter>::from_sketches(&sketches, 0.01).unwrap();

        let leaves = tree.leaves();
        assert_eq!(leaves, (0..n).collect::<Vec<_>>(), "n = {n}");
        assert_eq!(tree.len(), n);

        let unique: BTreeSet<_> = leaves.iter().collect();
        assert_eq!(unique.len(), n);
    }
}

#[test]
fn test_build_is_deterministic() {
    let sketches = random_sketches(21, 50, 13);
    let first = ClassificationTree::<BloomFilter>::from_sketches(&sketches, 0.001).unwrap();
    let second = ClassificationTree::<BloomFilter>::from_sketches(&sketches, 0.001).unwrap();

    assert_eq!(first.leaves(), second.leaves());
    assert_eq!(first.depth(), second.depth());
    assert_eq!(first.level_stats(), second.level_stats());

    for kmer in random_kmers(999, 500, 13) {
        assert_eq!(first.query(kmer.as_bytes()), second.query(kmer.as_bytes()));
    }
}

#[test]
fn test_subset_build_reports_only_selected_references() {
    let sketches = random_sketches(10, 20, 12);
    let indices = [1, 4, 7];
    let tree = ClassificationTree::<ExactSet>::build(&sketches, &indices, 0.001).unwrap();

    assert_eq!(tree.leaves(), vec![1, 4, 7]);
    for kmer in sketches[4].usable_kmers() {
        assert!(tree.query(kmer).contains(&4));
    }
    for kmer in sketches[5].usable_kmers() {
        let hits = tree.query(kmer);
        assert!(hits.iter().all(|i| indices.contains(i)));
    }
}

#[test]
fn test_prefilter_soundness() {
    let sketches = random_sketches(16, 100, 17);
    let config = ClassifierConfig::default().with_workers(1);
    let index = ReferenceIndex::<ExactSet>::build(&sketches, &config).unwrap();

    let known: BTreeSet<&[u8]> = sketches.iter().flat_map(|s| s.usable_kmers()).collect();
    for kmer in random_kmers(4242, 1000, 17) {
        let kmer = kmer.as_bytes();
        let passes = index.fast_index().contains(kmer);
        assert_eq!(passes, known.contains(kmer));
        if !passes {
            assert!(index.query(kmer).is_empty());
        }
    }
}

#[test]
fn test_exact_backend_matches_brute_force() {
    let sketches = random_sketches(9, 40, 6);
    let config = ClassifierConfig::default().with_workers(1);
    let index = ReferenceIndex::<ExactSet>::build(&sketches, &config).unwrap();

    for kmer in random_kmers(77, 300, 6) {
        let expected: BTreeSet<usize> = sketches
            .iter()
            .filter(|s| s.kmers.iter().any(|k| *k == kmer))
            .map(|s| s.index)
            .collect();
        assert_eq!(index.query(kmer.as_bytes()), expected, "k-mer {kmer}");
    }
}

#[test]
fn test_bloom_results_are_superset_of_exact() {
    let sketches = random_sketches(12, 80, 9);
    let config = ClassifierConfig::default().with_workers(1).with_fp_rate(0.05);
    let bloom = ReferenceIndex::<BloomFilter>::build(&sketches, &config).unwrap();
    let exact = ReferenceIndex::<ExactSet>::build(&sketches, &config).unwrap();

    for sketch in &sketches {
        for kmer in sketch.usable_kmers() {
            let approximate = bloom.query(kmer);
            assert!(exact.query(kmer).is_subset(&approximate));
        }
    }
}
