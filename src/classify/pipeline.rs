//! Producer/worker pipeline tallying k-mer hits per reference.
//!
//! The calling thread is the producer: it pushes every read onto the work
//! queue, then one `Stop` per worker, then joins the pool. Each worker loops
//! `pop -> classify -> pop` until it receives `Stop`.
//!
//! Failures are fail-fast. A worker that hits an error (or panics) raises a
//! shared abort flag and exits; the producer stops enqueueing, the remaining
//! workers stop at their next read, and the run returns
//! [`ClassifyError::WorkerFailure`]. Partial counts are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::counters::CounterArray;
use super::queue::{WorkItem, WorkQueue, WorkReceiver};
use super::ClassifyError;
use crate::core::types::ClassifierConfig;
use crate::filter::ApproxSet;
use crate::index::ReferenceIndex;
use crate::parsing::ParseError;
use crate::utils::validation::validate_worker_count;

/// Per-run processing totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Number of worker threads used
    pub workers: usize,
    /// Reads taken off the queue
    pub reads: u64,
    /// Reads shorter than k (no windows)
    pub reads_too_short: u64,
    /// K-mer windows examined
    pub kmers: u64,
    /// Windows that passed the exact pre-filter
    pub prefilter_hits: u64,
    /// Matching leaves across all windows (equals the sum of all counters)
    pub leaf_hits: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PipelineStats {
    fn merge(&mut self, other: &Self) {
        self.reads += other.reads;
        self.reads_too_short += other.reads_too_short;
        self.kmers += other.kmers;
        self.prefilter_hits += other.prefilter_hits;
        self.leaf_hits += other.leaf_hits;
    }
}

/// Final counts plus run statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Hit count per reference, in reference order
    pub counts: Vec<u64>,
    pub stats: PipelineStats,
}

/// Classifies a stream of reads against a [`ReferenceIndex`] with a worker pool
#[derive(Debug)]
pub struct ClassificationPipeline<'i, 'a, F> {
    index: &'i ReferenceIndex<'a, F>,
    num_workers: usize,
    queue_capacity: usize,
}

/// Raises the abort flag if the owning worker unwinds
struct AbortOnPanic<'f>(&'f AtomicBool);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(true, Ordering::Relaxed);
        }
    }
}

impl<'i, 'a, F: ApproxSet> ClassificationPipeline<'i, 'a, F> {
    /// Pipeline over `index` using the worker count and queue capacity of `config`
    pub fn new(index: &'i ReferenceIndex<'a, F>, config: &ClassifierConfig) -> Self {
        Self {
            index,
            num_workers: config.num_workers,
            queue_capacity: config.queue_capacity,
        }
    }

    /// Classify infallible in-memory reads.
    ///
    /// # Errors
    ///
    /// See [`ClassificationPipeline::run`].
    pub fn run_sequences<I>(&self, reads: I) -> Result<PipelineOutcome, ClassifyError>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.run(reads.into_iter().map(Ok))
    }

    /// Classify every read yielded by `reads` into a fresh counter array.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::InvalidConfig` for a zero worker count,
    /// `ClassifyError::WorkerFailure` if any worker fails, or
    /// `ClassifyError::Input` if `reads` yields an error.
    pub fn run<I>(&self, reads: I) -> Result<PipelineOutcome, ClassifyError>
    where
        I: IntoIterator<Item = Result<Vec<u8>, ParseError>>,
    {
        let counters = CounterArray::new(self.index.len());
        let stats = self.run_into(reads, &counters)?;
        Ok(PipelineOutcome {
            counts: counters.snapshot(),
            stats,
        })
    }

    /// Classify every read yielded by `reads`, adding hits to `counters`.
    ///
    /// `counters` must hold one slot per reference; a shorter array makes the
    /// first out-of-range hit fail its worker.
    ///
    /// # Errors
    ///
    /// Same as [`ClassificationPipeline::run`].
    pub fn run_into<I>(
        &self,
        reads: I,
        counters: &CounterArray,
    ) -> Result<PipelineStats, ClassifyError>
    where
        I: IntoIterator<Item = Result<Vec<u8>, ParseError>>,
    {
        let num_workers = validate_worker_count(self.num_workers)?;
        let start = Instant::now();
        let abort = AtomicBool::new(false);
        let (queue, receiver) = WorkQueue::new(self.queue_capacity);

        debug!(
            "Starting {num_workers} workers (queue capacity {})",
            self.queue_capacity
        );

        let (input_error, results) = std::thread::scope(|s| {
            let handles: Vec<_> = (0..num_workers)
                .map(|id| {
                    let receiver = receiver.clone();
                    let abort = &abort;
                    s.spawn(move || self.worker_loop(id, &receiver, counters, abort))
                })
                .collect();
            // Only workers hold receivers now, so a push can never block forever
            drop(receiver);

            let input_error = self.produce(reads, &queue, &abort);
            queue.send_stop(num_workers);

            let results: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
            (input_error, results)
        });

        let mut stats = PipelineStats {
            workers: num_workers,
            ..PipelineStats::default()
        };
        let mut failure = None;
        for (worker, result) in results.into_iter().enumerate() {
            match result {
                Ok(Ok(worker_stats)) => stats.merge(&worker_stats),
                Ok(Err(e)) if failure.is_none() => {
                    failure = Some(ClassifyError::WorkerFailure {
                        worker,
                        message: e.to_string(),
                    });
                }
                Err(payload) if failure.is_none() => {
                    failure = Some(ClassifyError::WorkerFailure {
                        worker,
                        message: panic_message(payload.as_ref()),
                    });
                }
                _ => {}
            }
        }

        if let Some(e) = failure {
            warn!("Classification aborted: {e}");
            return Err(e);
        }
        if let Some(e) = input_error {
            warn!("Classification aborted: {e}");
            return Err(ClassifyError::Input(e));
        }

        stats.elapsed = start.elapsed();
        info!(
            "Classified {} reads ({} k-mers, {} hits) in {:.2?}",
            stats.reads, stats.kmers, stats.leaf_hits, stats.elapsed
        );
        Ok(stats)
    }

    /// Push reads until the input ends, fails, or a worker aborts
    fn produce<I>(&self, reads: I, queue: &WorkQueue, abort: &AtomicBool) -> Option<ParseError>
    where
        I: IntoIterator<Item = Result<Vec<u8>, ParseError>>,
    {
        for read in reads {
            if abort.load(Ordering::Relaxed) {
                debug!("Worker failure reported, no further reads enqueued");
                return None;
            }
            match read {
                Ok(sequence) => {
                    if queue.push(sequence).is_err() {
                        return None;
                    }
                }
                Err(e) => {
                    abort.store(true, Ordering::Relaxed);
                    return Some(e);
                }
            }
        }
        None
    }

    fn worker_loop(
        &self,
        id: usize,
        receiver: &WorkReceiver,
        counters: &CounterArray,
        abort: &AtomicBool,
    ) -> Result<PipelineStats, ClassifyError> {
        let _guard = AbortOnPanic(abort);
        let mut stats = PipelineStats::default();
        debug!("Worker {id} waiting for work");

        while let WorkItem::Read(read) = receiver.pop() {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            if let Err(e) = self.classify_read(&read, counters, &mut stats) {
                abort.store(true, Ordering::Relaxed);
                return Err(e);
            }
        }

        debug!(
            "Worker {id} stopped after {} reads, {} hits",
            stats.reads, stats.leaf_hits
        );
        Ok(stats)
    }

    /// Slide a k-wide window over `read` and count every matching reference
    fn classify_read(
        &self,
        read: &[u8],
        counters: &CounterArray,
        stats: &mut PipelineStats,
    ) -> Result<(), ClassifyError> {
        let k = self.index.ksize();
        stats.reads += 1;
        if read.len() < k {
            stats.reads_too_short += 1;
            return Ok(());
        }

        for kmer in read.windows(k) {
            stats.kmers += 1;
            let mut leaf_hits = 0;
            let mut failure = None;
            let passed = self.index.classify_kmer(kmer, |leaf| {
                leaf_hits += 1;
                if let Err(e) = counters.increment(leaf) {
                    failure = Some(e);
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
            if passed {
                stats.prefilter_hits += 1;
            }
            stats.leaf_hits += leaf_hits;
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
