//! Lock-Free SPSC Byte Queue Implementation

use crate::QueueError;
use std::sync::atomic::{fence, AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default buffer capacity (256 bytes = ~3 NMEA sentences)
pub const DEFAULT_CAPACITY: usize = 256;

/// State shared by the producer and consumer halves
struct Shared {
    /// Pre-allocated storage
    storage: Box<[AtomicU8]>,
    /// Capacity of the buffer
    capacity: usize,
    /// Head position (write cursor), kept in `0..2 * capacity`
    head: AtomicUsize,
    /// Tail position (read cursor), kept in `0..2 * capacity`
    tail: AtomicUsize,
    /// Bytes discarded because the queue was full
    dropped: AtomicUsize,
    /// Total bytes accepted (for statistics)
    total_written: AtomicUsize,
    /// Set while a consumer is about to sleep in `pop`
    parked: AtomicBool,
    /// Wakes a consumer parked in `pop`
    readable: Notify,
}

impl Shared {
    /// Cursors run over twice the capacity so that full and empty differ
    fn advance(&self, cursor: usize) -> usize {
        (cursor + 1) % (2 * self.capacity)
    }

    fn distance(&self, head: usize, tail: usize) -> usize {
        (head + 2 * self.capacity - tail) % (2 * self.capacity)
    }

    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        self.distance(head, tail)
    }
}

/// Fixed-capacity byte queue, not yet split into its two halves
pub struct ByteQueue {
    shared: Arc<Shared>,
}

impl ByteQueue {
    /// Create a new queue with given capacity
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self::allocate(capacity))
    }

    /// Create a queue with default capacity (256 bytes)
    pub fn with_default_capacity() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }

    fn allocate(capacity: usize) -> Self {
        let storage: Vec<AtomicU8> = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        Self {
            shared: Arc::new(Shared {
                storage: storage.into_boxed_slice(),
                capacity,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
                total_written: AtomicUsize::new(0),
                parked: AtomicBool::new(false),
                readable: Notify::new(),
            }),
        }
    }

    /// Split into the producer half (serial receive context) and the
    /// consumer half (parser task). Consuming `self` makes a second split
    /// impossible.
    pub fn split(self) -> (Producer, Consumer) {
        (
            Producer {
                shared: Arc::clone(&self.shared),
            },
            Consumer {
                shared: self.shared,
            },
        )
    }
}

/// Writing half of a [`ByteQueue`]
///
/// `push` never blocks, never allocates and never reports failure, so it is
/// safe to call from an interrupt-like context.
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Push a byte into the queue (dropped silently if the queue is full)
    pub fn push(&mut self, byte: u8) {
        let shared = &*self.shared;
        // Only this half writes `head`
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);

        if shared.distance(head, tail) == shared.capacity {
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        shared.storage[head % shared.capacity].store(byte, Ordering::Relaxed);
        // Publishes the slot write above to the consumer
        shared.head.store(shared.advance(head), Ordering::Release);
        shared.total_written.fetch_add(1, Ordering::Relaxed);

        // Pairs with the fence in `Consumer::pop`: either the consumer sees
        // the new head or this load sees it parked
        fence(Ordering::SeqCst);
        if shared.parked.load(Ordering::Relaxed) && shared.parked.swap(false, Ordering::Relaxed) {
            shared.readable.notify_one();
        }
    }

    /// Get the number of bytes currently queued
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the next push would be dropped
    pub fn is_full(&self) -> bool {
        self.len() == self.shared.capacity
    }

    /// Get the queue capacity
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Get the number of bytes lost to overflow so far
    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

/// Reading half of a [`ByteQueue`]
pub struct Consumer {
    shared: Arc<Shared>,
}

impl Consumer {
    /// Pop the oldest byte, or `None` if the queue is empty
    pub fn try_pop(&mut self) -> Option<u8> {
        let shared = &*self.shared;
        // Only this half writes `tail`
        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let byte = shared.storage[tail % shared.capacity].load(Ordering::Relaxed);
        // Hands the slot back to the producer only after it has been read
        shared.tail.store(shared.advance(tail), Ordering::Release);
        Some(byte)
    }

    /// Wait until a byte is available and pop it
    ///
    /// The producer only signals while a consumer is parked here, so pushes
    /// feeding a `try_pop` reader cost no wakeup.
    pub async fn pop(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.try_pop() {
                return byte;
            }

            self.shared.parked.store(true, Ordering::Relaxed);
            fence(Ordering::SeqCst);
            if let Some(byte) = self.try_pop() {
                self.shared.parked.store(false, Ordering::Relaxed);
                return byte;
            }
            // A push after the fence stores a permit, so this cannot miss it
            self.shared.readable.notified().await;
        }
    }

    /// Discard everything currently queued
    pub fn clear(&mut self) {
        let head = self.shared.head.load(Ordering::Acquire);
        self.shared.tail.store(head, Ordering::Release);
    }

    /// Get the number of bytes currently queued
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the queue capacity
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Get the number of bytes lost to overflow so far
    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Get total bytes accepted since creation (for statistics)
    pub fn total_written(&self) -> usize {
        self.shared.total_written.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(ByteQueue::new(0).err(), Some(QueueError::ZeroCapacity));
    }

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = ByteQueue::new(8).unwrap().split();

        for b in 0..8u8 {
            tx.push(b);
        }
        assert!(tx.is_full());

        let popped: Vec<u8> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(popped, (0..8).collect::<Vec<u8>>());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_drop_newest_when_full() {
        let (mut tx, mut rx) = ByteQueue::new(4).unwrap().split();

        for b in b"abcdef" {
            tx.push(*b);
        }

        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.total_written(), 4);
        let popped: Vec<u8> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(popped, b"abcd");
    }

    #[test]
    fn test_wraparound() {
        let (mut tx, mut rx) = ByteQueue::new(3).unwrap().split();

        // Cycle the cursors many times around both the storage and the
        // doubled index range
        for round in 0..100u8 {
            tx.push(round);
            tx.push(round.wrapping_add(1));
            assert_eq!(rx.len(), 2);
            assert_eq!(rx.try_pop(), Some(round));
            assert_eq!(rx.try_pop(), Some(round.wrapping_add(1)));
            assert_eq!(rx.try_pop(), None);
        }
        assert_eq!(rx.dropped(), 0);
    }

    #[test]
    fn test_clear() {
        let (mut tx, mut rx) = ByteQueue::new(16).unwrap().split();
        for b in b"garbage" {
            tx.push(*b);
        }
        rx.clear();
        assert!(rx.is_empty());
        tx.push(b'x');
        assert_eq!(rx.try_pop(), Some(b'x'));
    }

    #[test]
    fn test_cross_thread_order() {
        const COUNT: usize = 100_000;
        let (mut tx, mut rx) = ByteQueue::new(64).unwrap().split();

        let producer = std::thread::spawn(move || {
            let mut sent = 0;
            while sent < COUNT {
                if !tx.is_full() {
                    tx.push((sent % 251) as u8);
                    sent += 1;
                } else {
                    std::thread::yield_now();
                }
            }
            tx.dropped()
        });

        let mut received = 0;
        while received < COUNT {
            match rx.try_pop() {
                Some(b) => {
                    assert_eq!(b, (received % 251) as u8, "stale or duplicate byte");
                    received += 1;
                }
                None => std::thread::yield_now(),
            }
        }

        assert_eq!(producer.join().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let (mut tx, mut rx) = ByteQueue::new(8).unwrap().split();

        let reader = tokio::spawn(async move { rx.pop().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.push(b'$');

        let byte = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("pop never woke up")
            .unwrap();
        assert_eq!(byte, b'$');
    }

    #[test]
    fn test_push_without_parked_consumer_skips_wakeup() {
        let (mut tx, mut rx) = ByteQueue::new(8).unwrap().split();
        tx.push(b'a');
        assert!(!tx.shared.parked.load(Ordering::Relaxed));
        assert_eq!(rx.try_pop(), Some(b'a'));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pop_follows_producer_thread() {
        const COUNT: usize = 10_000;
        let (mut tx, mut rx) = ByteQueue::new(16).unwrap().split();

        let producer = std::thread::spawn(move || {
            let mut sent = 0;
            while sent < COUNT {
                if tx.is_full() {
                    std::thread::yield_now();
                } else {
                    tx.push((sent % 251) as u8);
                    sent += 1;
                }
            }
        });

        let received = tokio::time::timeout(Duration::from_secs(10), async {
            for i in 0..COUNT {
                assert_eq!(rx.pop().await, (i % 251) as u8);
            }
            rx
        })
        .await
        .expect("pop missed a wakeup");

        producer.join().unwrap();
        assert_eq!(received.dropped(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Pop,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u8>().prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        #[test]
        fn prop_matches_bounded_fifo(capacity in 1usize..32, ops in prop::collection::vec(op_strategy(), 0..256)) {
            let (mut tx, mut rx) = ByteQueue::new(capacity).unwrap().split();
            let mut model = VecDeque::new();
            let mut dropped = 0;

            for op in ops {
                match op {
                    Op::Push(b) => {
                        if model.len() < capacity {
                            model.push_back(b);
                        } else {
                            dropped += 1;
                        }
                        tx.push(b);
                    }
                    Op::Pop => prop_assert_eq!(rx.try_pop(), model.pop_front()),
                }
                prop_assert_eq!(rx.len(), model.len());
            }

            prop_assert_eq!(rx.dropped(), dropped);
        }
    }
}
