//! FIFO of reads between the producer and the worker pool.
//!
//! Backed by a crossbeam channel: bounded when a capacity is given (the
//! producer blocks while the queue is full), unbounded for capacity zero.
//! Shutdown is signalled in-band with one [`WorkItem::Stop`] per worker.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// A unit of work handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A read sequence to classify
    Read(Vec<u8>),
    /// Terminate the receiving worker
    Stop,
}

/// Producer half of the work queue
#[derive(Debug)]
pub struct WorkQueue {
    sender: Sender<WorkItem>,
}

/// Consumer half of the work queue; clone one per worker
#[derive(Debug, Clone)]
pub struct WorkReceiver {
    receiver: Receiver<WorkItem>,
}

/// Every receiver has been dropped, so nothing will ever consume the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

impl WorkQueue {
    /// Create a queue holding at most `capacity` items (0 = unbounded)
    pub fn new(capacity: usize) -> (Self, WorkReceiver) {
        let (sender, receiver) = if capacity == 0 {
            unbounded()
        } else {
            bounded(capacity)
        };
        (Self { sender }, WorkReceiver { receiver })
    }

    /// Enqueue a read, blocking while a bounded queue is full.
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` once every receiver is gone.
    pub fn push(&self, read: Vec<u8>) -> Result<(), QueueClosed> {
        self.sender.send(WorkItem::Read(read)).map_err(|_| QueueClosed)
    }

    /// Enqueue one `Stop` per worker.
    ///
    /// Stops for workers that already exited are harmless: once no receiver
    /// remains the remaining sends are dropped.
    pub fn send_stop(&self, workers: usize) {
        for _ in 0..workers {
            if self.sender.send(WorkItem::Stop).is_err() {
                break;
            }
        }
    }

    /// Items currently waiting
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

impl WorkReceiver {
    /// Block until an item is available.
    ///
    /// A queue whose producer has gone away reads as `Stop`.
    pub fn pop(&self) -> WorkItem {
        self.receiver.recv().unwrap_or(WorkItem::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (queue, receiver) = WorkQueue::new(0);
        queue.push(b"AAAA".to_vec()).unwrap();
        queue.push(b"CCCC".to_vec()).unwrap();
        queue.send_stop(1);
        assert_eq!(queue.len(), 3);

        assert_eq!(receiver.pop(), WorkItem::Read(b"AAAA".to_vec()));
        assert_eq!(receiver.pop(), WorkItem::Read(b"CCCC".to_vec()));
        assert_eq!(receiver.pop(), WorkItem::Stop);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_closed_producer_reads_as_stop() {
        let (queue, receiver) = WorkQueue::new(4);
        drop(queue);
        assert_eq!(receiver.pop(), WorkItem::Stop);
    }

    #[test]
    fn test_push_fails_without_receivers() {
        let (queue, receiver) = WorkQueue::new(1);
        drop(receiver);
        assert_eq!(queue.push(b"ACGT".to_vec()), Err(QueueClosed));
        queue.send_stop(3);
    }

    #[test]
    fn test_bounded_queue_applies_backpressure() {
        let (queue, receiver) = WorkQueue::new(1);
        queue.push(b"AAAA".to_vec()).unwrap();

        std::thread::scope(|s| {
            let handle = s.spawn(|| queue.push(b"CCCC".to_vec()));
            // The second push can only complete once a slot frees up
            assert_eq!(receiver.pop(), WorkItem::Read(b"AAAA".to_vec()));
            assert!(handle.join().unwrap().is_ok());
        });
        assert_eq!(receiver.pop(), WorkItem::Read(b"CCCC".to_vec()));
    }
}
