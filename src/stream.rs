//! Bounded batch streams connecting pipeline stages.
//!
//! A [`Stream`] is a bounded FIFO of sample batches backed by a crossbeam
//! channel. Producers block while the stream is full and consumers block
//! while it is empty, so a slow stage throttles the stages feeding it.
//!
//! The stream owns both channel ends, so it stays usable for as long as it
//! exists: workers can be started, stopped and restarted against the same
//! stream, and a consumer holding it sees one uninterrupted sequence of
//! batches.
//!
//! # Example
//!
//! ```
//! use radiochain::stream::Stream;
//!
//! let stream: Stream<f32> = Stream::bounded(4);
//! stream.push(vec![1.0, 2.0])?;
//! assert_eq!(stream.pull()?, vec![1.0, 2.0]);
//! assert!(stream.try_pull().is_none());
//! # Ok::<(), radiochain::Error>(())
//! ```

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use crate::error::{Error, Result};

/// Bounded FIFO of sample batches.
pub struct Stream<T> {
    tx: Sender<Vec<T>>,
    rx: Receiver<Vec<T>>,
}

impl<T> Stream<T> {
    /// Create a stream holding at most `capacity` batches.
    ///
    /// A capacity of zero is raised to one.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Push a batch, blocking while the stream is full.
    pub fn push(&self, batch: Vec<T>) -> Result<()> {
        self.tx.send(batch).map_err(|_| Error::StreamClosed)
    }

    /// Push a batch without blocking.
    ///
    /// Returns the batch back if the stream is full.
    pub fn try_push(&self, batch: Vec<T>) -> Result<Option<Vec<T>>> {
        match self.tx.try_send(batch) {
            Ok(()) => Ok(None),
            Err(TrySendError::Full(batch)) => Ok(Some(batch)),
            Err(TrySendError::Disconnected(_)) => Err(Error::StreamClosed),
        }
    }

    /// Pull the next batch, blocking while the stream is empty.
    pub fn pull(&self) -> Result<Vec<T>> {
        self.rx.recv().map_err(|_| Error::StreamClosed)
    }

    /// Pull the next batch if one is ready.
    pub fn try_pull(&self) -> Option<Vec<T>> {
        self.rx.try_recv().ok()
    }

    /// Pull the next batch, waiting at most `timeout`.
    pub fn pull_timeout(&self, timeout: Duration) -> Option<Vec<T>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Discard every queued batch, returning how many were dropped.
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Number of queued batches.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }

    /// Maximum number of queued batches.
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    /// Producer handle for a worker writing into this stream.
    pub(crate) fn sender(&self) -> Sender<Vec<T>> {
        self.tx.clone()
    }

    /// Consumer handle for a worker reading from this stream.
    pub(crate) fn receiver(&self) -> Receiver<Vec<T>> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let stream = Stream::bounded(3);
        stream.push(vec![1]).unwrap();
        stream.push(vec![2, 3]).unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.pull().unwrap(), vec![1]);
        assert_eq!(stream.pull().unwrap(), vec![2, 3]);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let stream = Stream::bounded(2);
        assert_eq!(stream.capacity(), 2);
        assert_eq!(stream.try_push(vec![1]).unwrap(), None);
        assert_eq!(stream.try_push(vec![2]).unwrap(), None);
        assert!(stream.is_full());
        assert_eq!(stream.try_push(vec![3]).unwrap(), Some(vec![3]));
    }

    #[test]
    fn test_zero_capacity_raised() {
        let stream: Stream<u8> = Stream::bounded(0);
        assert_eq!(stream.capacity(), 1);
    }

    #[test]
    fn test_pull_timeout_on_empty() {
        let stream: Stream<f32> = Stream::bounded(1);
        assert!(stream.pull_timeout(Duration::from_millis(10)).is_none());
        assert!(stream.try_pull().is_none());
    }

    #[test]
    fn test_clear() {
        let stream = Stream::bounded(4);
        stream.push(vec![1.0f32]).unwrap();
        stream.push(vec![2.0f32]).unwrap();
        assert_eq!(stream.clear(), 2);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_blocking_push_released_by_consumer() {
        let stream = std::sync::Arc::new(Stream::bounded(1));
        stream.push(vec![0u32]).unwrap();

        let producer = {
            let stream = stream.clone();
            thread::spawn(move || {
                for i in 1..10u32 {
                    stream.push(vec![i]).unwrap();
                }
            })
        };

        let mut received = Vec::new();
        while received.len() < 10 {
            received.extend(stream.pull().unwrap());
        }
        producer.join().unwrap();
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }
}
