use serde::{Deserialize, Serialize};

use crate::utils::validation::{
    validate_fp_rate, validate_kmer_size, validate_worker_count, ValidationError,
};

/// Default target false-positive rate for every tree node filter
pub const DEFAULT_FP_RATE: f64 = 0.001;

/// Default number of reads the work queue holds before the producer blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Approximate-membership backend used for tree node filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FilterBackend {
    /// Bit-vector bloom filter sized from the false-positive rate
    #[default]
    Bloom,
    /// Exact hash set (no false positives, more memory)
    Exact,
}

impl std::fmt::Display for FilterBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bloom => write!(f, "bloom"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Configuration consumed by index construction and the classification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Expected k-mer length. `None` takes it from the reference sketches.
    pub ksize: Option<usize>,

    /// Number of worker threads pulling reads from the queue
    pub num_workers: usize,

    /// Target false-positive rate for node filters
    pub fp_rate: f64,

    /// Work queue capacity (0 = unbounded)
    pub queue_capacity: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ksize: None,
            num_workers: default_worker_count(),
            fp_rate: DEFAULT_FP_RATE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn with_ksize(mut self, k: usize) -> Self {
        self.ksize = Some(k);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    #[must_use]
    pub fn with_fp_rate(mut self, rate: f64) -> Self {
        self.fp_rate = rate;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(k) = self.ksize {
            validate_kmer_size(k)?;
        }
        validate_worker_count(self.num_workers)?;
        validate_fp_rate(self.fp_rate)?;
        Ok(())
    }
}

/// Number of workers used when none is configured: one per available core
#[must_use]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
