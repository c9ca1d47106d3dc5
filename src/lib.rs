//! # kmer-tally
//!
//! A library for classifying sequencing reads against reference k-mer sets.
//!
//! Given a set of reference genomes, each reduced to its k-mers (a "sketch"),
//! `kmer-tally` counts for every reference how many k-mers of a read stream it
//! contains. Testing every k-mer against every reference is too slow for large
//! reference sets, so the references are organised into a binary tree of bloom
//! filters: a k-mer only descends into subtrees whose filter accepts it.
//!
//! ## Features
//!
//! - **Filter tree**: recursive bisection of the reference list, one bloom filter per node
//! - **Exact pre-filter**: k-mers found in no reference never reach the tree
//! - **Concurrent pipeline**: bounded work queue feeding a pool of worker threads
//! - **Lock-free tallies**: one atomic counter per reference
//! - **Streaming input**: FASTA/FASTQ reads, gzip compressed or from stdin
//!
//! ## Example
//!
//! ```rust
//! use kmer_tally::{ClassificationPipeline, ClassifierConfig, ReferenceIndex, ReferenceSketch};
//!
//! let sketches = vec![
//!     ReferenceSketch::new(0, "ref_a", 4, vec!["AAAA".into(), "AAAC".into()]),
//!     ReferenceSketch::new(1, "ref_c", 4, vec!["CCCC".into()]),
//! ];
//! let config = ClassifierConfig::default().with_workers(2);
//! let index: ReferenceIndex = ReferenceIndex::build(&sketches, &config).unwrap();
//!
//! let reads = vec![b"AAAACCCC".to_vec()];
//! let outcome = ClassificationPipeline::new(&index, &config)
//!     .run_sequences(reads)
//!     .unwrap();
//!
//! for (sketch, count) in sketches.iter().zip(&outcome.counts) {
//!     println!("{}: {count}", sketch.source_name);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`filter`]: Approximate-membership sets (bloom filter, exact set) and sizing
//! - [`index`]: Classification tree, fast lookup set and the combined reference index
//! - [`classify`]: Counters, work queue, worker pipeline and reports
//! - [`core`]: Reference sketches and configuration types
//! - [`parsing`]: K-mer set files, reference FASTA and read streams
//! - [`cli`]: Command-line interface implementation

pub mod classify;
pub mod cli;
pub mod core;
pub mod filter;
pub mod index;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use classify::{
    ClassificationPipeline, ClassificationReport, ClassifyError, CounterArray, PipelineOutcome,
};
pub use crate::core::sketch::ReferenceSketch;
pub use crate::core::types::*;
pub use filter::{ApproxSet, BloomFilter, ExactSet};
pub use index::{ClassificationTree, FastLookupIndex, IndexError, ReferenceIndex};
