//! Concurrent read classification.
//!
//! A single producer streams reads onto a [`WorkQueue`]; a fixed pool of
//! workers pulls them off, slides a k-mer window over each read, resolves
//! every window through the [`ReferenceIndex`](crate::index::ReferenceIndex)
//! and bumps the matching references in a shared [`CounterArray`].
//!
//! ## Example
//!
//! ```rust
//! use kmer_tally::classify::ClassificationPipeline;
//! use kmer_tally::core::sketch::ReferenceSketch;
//! use kmer_tally::core::types::ClassifierConfig;
//! use kmer_tally::filter::BloomFilter;
//! use kmer_tally::index::ReferenceIndex;
//!
//! let sketches = vec![
//!     ReferenceSketch::new(0, "a", 4, vec!["AAAA".into()]),
//!     ReferenceSketch::new(1, "c", 4, vec!["CCCC".into()]),
//! ];
//! let config = ClassifierConfig::default().with_workers(2);
//! let index = ReferenceIndex::<BloomFilter>::build(&sketches, &config).unwrap();
//!
//! let reads = vec![b"AAAAA".to_vec(), b"CCCC".to_vec()];
//! let outcome = ClassificationPipeline::new(&index, &config)
//!     .run_sequences(reads)
//!     .unwrap();
//! assert_eq!(outcome.counts, vec![2, 1]);
//! ```

pub mod counters;
pub mod pipeline;
pub mod queue;
pub mod report;

use thiserror::Error;

use crate::parsing::ParseError;
use crate::utils::validation::ValidationError;

pub use counters::CounterArray;
pub use pipeline::{ClassificationPipeline, PipelineOutcome, PipelineStats};
pub use queue::{QueueClosed, WorkItem, WorkQueue, WorkReceiver};
pub use report::{ClassificationReport, ReportEntry};

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Counter index {index} out of range for {len} references")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Worker {worker} failed: {message}")]
    WorkerFailure { worker: usize, message: String },

    #[error("Failed to read input: {0}")]
    Input(#[from] ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}
