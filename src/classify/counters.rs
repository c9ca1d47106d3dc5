use std::sync::atomic::{AtomicU64, Ordering};

use super::ClassifyError;

/// One hit counter per reference, safe to bump from many threads at once.
///
/// Counters only ever grow. Each slot is an independent atomic, so updates to
/// different references never contend and concurrent updates to the same
/// reference are never lost.
#[derive(Debug, Default)]
pub struct CounterArray {
    counters: Vec<AtomicU64>,
}

impl CounterArray {
    /// `len` counters, all zero
    pub fn new(len: usize) -> Self {
        Self {
            counters: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Add one to counter `index`.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::IndexOutOfRange` if `index >= len()`.
    pub fn increment(&self, index: usize) -> Result<(), ClassifyError> {
        self.slot(index)?.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current value of counter `index`.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::IndexOutOfRange` if `index >= len()`.
    pub fn value(&self, index: usize) -> Result<u64, ClassifyError> {
        Ok(self.slot(index)?.load(Ordering::Relaxed))
    }

    /// Copy of every counter, in index order
    pub fn snapshot(&self) -> Vec<u64> {
        self.counters
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    /// Sum over all counters
    pub fn total(&self) -> u64 {
        self.counters.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    fn slot(&self, index: usize) -> Result<&AtomicU64, ClassifyError> {
        self.counters
            .get(index)
            .ok_or(ClassifyError::IndexOutOfRange {
                index,
                len: self.counters.len(),
            })
    }
}
