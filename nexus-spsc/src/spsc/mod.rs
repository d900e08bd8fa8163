//! Single-producer single-consumer (SPSC) bounded queue with look-ahead.
//!
//! The queue is wait-free: every operation finishes in a bounded number of
//! steps and none of them use compare-and-swap. Producer and consumer
//! synchronize through per-slot occupancy flags (Release on write and clear,
//! Acquire on observe). The two monotonic counters are published with plain
//! Release stores and exist for [`len`](Consumer::len) and progress
//! monitoring.
//!
//! # Look-ahead
//!
//! Checking whether the next slot is free means reading a cache line the
//! consumer is also writing. Instead of doing that on every push, the
//! producer checks the slot `look_ahead_step` positions ahead. If that slot
//! is free then, because the consumer frees slots strictly in order, every
//! slot in between is free too, and the producer can push that many times
//! without looking at shared memory again. When the far slot is taken the
//! producer falls back to checking only the slot it is about to write.
//!
//! The step is `min(capacity / 4, max)`, with the process-wide maximum from
//! [`config::max_look_ahead_step`](crate::config::max_look_ahead_step).
//!
//! # Example
//!
//! ```
//! use nexus_spsc::spsc;
//!
//! let (mut tx, mut rx) = spsc::channel::<u64>(1024).unwrap();
//!
//! tx.push(1).unwrap();
//! tx.push(2).unwrap();
//!
//! assert_eq!(rx.peek(), Some(&1));
//! assert_eq!(rx.pop(), Some(1));
//! assert_eq!(rx.pop(), Some(2));
//! assert_eq!(rx.pop(), None);
//! ```
//!
//! # Disconnection
//!
//! Dropping either endpoint does not affect the other; elements already in
//! the queue stay poppable. [`Producer::is_disconnected`] and
//! [`Consumer::is_disconnected`] report whether the opposite endpoint is
//! gone. Elements left in the queue are dropped together with the last
//! handle.

mod buffer;
mod ring;

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use ring::Ring;

use crate::config;
use crate::size;
use crate::sync::{Arc, Ordering};
use crate::{CapacityError, Full};

/// Smallest capacity a queue is built with.
pub const MIN_CAPACITY: usize = 4;

/// Largest capacity a queue can be built with.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Creates a new SPSC queue with room for at least `capacity` elements.
///
/// The actual capacity is `max(capacity, 4)` rounded up to the next power
/// of two.
///
/// # Errors
///
/// Returns [`CapacityError::Zero`] if `capacity` is 0, and
/// [`CapacityError::TooLarge`] if the rounded capacity would exceed
/// [`MAX_CAPACITY`].
///
/// # Example
///
/// ```
/// use nexus_spsc::spsc;
///
/// let (tx, _rx) = spsc::channel::<String>(100).unwrap();
/// // Actual capacity will be 128 (next power of two)
/// assert_eq!(tx.capacity(), 128);
///
/// let (tx, _rx) = spsc::channel::<String>(1).unwrap();
/// assert_eq!(tx.capacity(), 4); // Minimum is 4
///
/// assert!(spsc::channel::<String>(0).is_err());
/// ```
pub fn channel<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), CapacityError> {
    if capacity == 0 {
        return Err(CapacityError::Zero);
    }
    if capacity > MAX_CAPACITY {
        return Err(CapacityError::TooLarge {
            requested: capacity,
            max: MAX_CAPACITY,
        });
    }

    let rounded = capacity.max(MIN_CAPACITY).next_power_of_two();
    let look_ahead_step = config::look_ahead_step(rounded, config::max_look_ahead_step());

    log::debug!(
        "creating spsc queue: requested={capacity} capacity={rounded} look_ahead_step={look_ahead_step}"
    );

    let ring = Arc::new(Ring::new(rounded));

    Ok((
        Producer {
            producer_index: 0,
            producer_limit: 0,
            look_ahead_step,
            ring: Arc::clone(&ring),
            _not_sync: PhantomData,
        },
        Consumer {
            consumer_index: 0,
            ring,
            _not_sync: PhantomData,
        },
    ))
}

/// Creates a new SPSC queue, panicking on an unsupported capacity.
///
/// # Panics
///
/// Panics if `capacity` is 0 or exceeds [`MAX_CAPACITY`].
pub fn with_capacity<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    match channel(capacity) {
        Ok(pair) => pair,
        Err(err) => panic!("{err}"),
    }
}

/// Exposes the raw producer and consumer counters for progress monitoring.
///
/// Values are some past or current value of each counter; there is no
/// ordering guarantee between the two. Useful for spotting a stalled
/// producer or consumer, not for computing an exact length.
pub trait ProgressIndicators {
    /// Total number of elements ever pushed.
    fn current_producer_index(&self) -> u64;

    /// Total number of elements ever popped.
    fn current_consumer_index(&self) -> u64;
}

/// The producing half of an SPSC queue.
///
/// This struct can only be owned by a single thread at a time (implements `Send` but not `Sync`).
pub struct Producer<T> {
    /// Our write position (authoritative, only we update this)
    producer_index: u64,

    /// Indices below this are known to be free without checking the slot
    producer_limit: u64,

    look_ahead_step: u64,

    ring: Arc<Ring<T>>,

    _not_sync: PhantomData<Cell<()>>,
}

impl<T> Producer<T> {
    /// Attempts to push a value into the queue.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the queue is full, giving the value back.
    /// Nothing in the queue changes in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_spsc::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::channel::<u32>(4).unwrap();
    ///
    /// for i in 0..4 {
    ///     tx.push(i).unwrap();
    /// }
    ///
    /// // Queue is now full
    /// assert_eq!(tx.push(4).unwrap_err().into_inner(), 4);
    ///
    /// assert_eq!(rx.pop(), Some(0));
    /// assert!(tx.push(4).is_ok());
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        let Some(index) = self.claim() else {
            return Err(Full(value));
        };

        // Safety: claim() observed the slot empty (or a later slot empty,
        // which implies this one is), and we're the only producer.
        unsafe { self.ring.buffer().write(index, value) };
        self.advance(index);

        Ok(())
    }

    /// Pushes up to `limit` values produced by `supplier`.
    ///
    /// `supplier` is only called once a free slot has been found, so no
    /// value is ever created and then rejected. Stops early when the queue
    /// is full. Returns the number of values pushed.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_spsc::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::channel::<u32>(8).unwrap();
    ///
    /// let mut next = 0;
    /// let pushed = tx.fill(
    ///     || {
    ///         next += 1;
    ///         next
    ///     },
    ///     100,
    /// );
    /// assert_eq!(pushed, 8);
    /// assert_eq!(rx.pop(), Some(1));
    /// ```
    pub fn fill<F>(&mut self, mut supplier: F, limit: usize) -> usize
    where
        F: FnMut() -> T,
    {
        let mut pushed = 0;
        while pushed < limit {
            let Some(index) = self.claim() else {
                break;
            };

            let value = supplier();
            // Safety: see push.
            unsafe { self.ring.buffer().write(index, value) };
            self.advance(index);
            pushed += 1;
        }
        pushed
    }

    /// Returns the index we may write next, or `None` if the queue is full.
    #[inline(always)]
    fn claim(&mut self) -> Option<u64> {
        let index = self.producer_index;

        // Fast path: below the cached limit (no shared memory access!)
        if index < self.producer_limit {
            return Some(index);
        }

        self.claim_slow(index)
    }

    #[cold]
    fn claim_slow(&mut self, index: u64) -> Option<u64> {
        let buffer = self.ring.buffer();
        let ahead = index + self.look_ahead_step;

        // The consumer frees slots in order, so a free slot `ahead` means
        // every slot in [index, ahead) is free as well.
        if !buffer.is_occupied(ahead, Ordering::Acquire) {
            self.producer_limit = ahead;
            return Some(index);
        }

        if buffer.is_occupied(index, Ordering::Acquire) {
            return None;
        }

        Some(index)
    }

    #[inline(always)]
    fn advance(&mut self, index: u64) {
        let next = index + 1;
        self.producer_index = next;
        self.ring.publish_producer_index(next);
    }

    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.buffer().capacity()
    }

    /// Returns how many slots ahead the producer checks when refreshing
    /// its free-slot limit.
    #[inline]
    pub fn look_ahead_step(&self) -> u64 {
        self.look_ahead_step
    }

    /// Returns `true` if the consumer has been dropped.
    ///
    /// Note: This may return a stale value; the consumer could be dropped
    /// immediately after this returns `false`.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.ring.is_consumer_dropped()
    }

    /// Returns the number of elements currently in the queue.
    ///
    /// Note: This is a snapshot and may be immediately stale in concurrent contexts.
    #[inline]
    pub fn len(&self) -> usize {
        size::size(&*self.ring)
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        size::is_empty(&*self.ring)
    }

    /// Returns a read-only view of the queue that can be shared freely.
    pub fn monitor(&self) -> Monitor<T> {
        Monitor {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<T> ProgressIndicators for Producer<T> {
    #[inline]
    fn current_producer_index(&self) -> u64 {
        self.ring.load_producer_index()
    }

    #[inline]
    fn current_consumer_index(&self) -> u64 {
        self.ring.load_consumer_index()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.ring.set_producer_dropped();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("producer_index", &self.producer_index)
            .field("producer_limit", &self.producer_limit)
            .field("look_ahead_step", &self.look_ahead_step)
            .field("disconnected", &self.is_disconnected())
            .finish_non_exhaustive()
    }
}

/// The consuming half of an SPSC queue.
///
/// This struct can only be owned by a single thread at a time (implements `Send` but not `Sync`).
pub struct Consumer<T> {
    /// Our read position (authoritative, only we update this)
    consumer_index: u64,

    ring: Arc<Ring<T>>,

    _not_sync: PhantomData<Cell<()>>,
}

impl<T> Consumer<T> {
    /// Attempts to pop a value from the queue.
    ///
    /// Returns `None` if the queue is empty. An empty result is only a
    /// momentary observation if the producer is pushing concurrently.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_spsc::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::channel::<u32>(8).unwrap();
    ///
    /// assert_eq!(rx.pop(), None); // Empty
    ///
    /// tx.push(42).unwrap();
    /// assert_eq!(rx.pop(), Some(42));
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let index = self.consumer_index;
        let buffer = self.ring.buffer();

        if !buffer.is_occupied(index, Ordering::Acquire) {
            return None;
        }

        // Safety: the slot was observed occupied with Acquire, and we're
        // the only consumer.
        let value = unsafe { buffer.take(index) };

        let next = index + 1;
        self.consumer_index = next;
        self.ring.publish_consumer_index(next);

        Some(value)
    }

    /// Returns a reference to the next value without removing it.
    ///
    /// The reference borrows the consumer, so the value cannot be popped
    /// while it is held.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_spsc::spsc;
    ///
    /// let (mut tx, rx) = spsc::channel::<String>(8).unwrap();
    ///
    /// assert_eq!(rx.peek(), None);
    ///
    /// tx.push("hello".to_string()).unwrap();
    /// assert_eq!(rx.peek().map(String::as_str), Some("hello"));
    /// assert_eq!(rx.len(), 1);
    /// ```
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        let index = self.consumer_index;
        let buffer = self.ring.buffer();

        if !buffer.is_occupied(index, Ordering::Acquire) {
            return None;
        }

        // Safety: the slot is occupied and only we can clear it, which
        // requires `&mut self`.
        Some(unsafe { buffer.get(index) })
    }

    /// Pops up to `limit` values, handing each to `sink`.
    ///
    /// Stops early when the queue is observed empty. Returns the number of
    /// values popped.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_spsc::spsc;
    ///
    /// let (mut tx, mut rx) = spsc::channel::<u32>(8).unwrap();
    /// for i in 0..5 {
    ///     tx.push(i).unwrap();
    /// }
    ///
    /// let mut out = Vec::new();
    /// assert_eq!(rx.drain(|v| out.push(v), 3), 3);
    /// assert_eq!(out, vec![0, 1, 2]);
    /// ```
    pub fn drain<F>(&mut self, mut sink: F, limit: usize) -> usize
    where
        F: FnMut(T),
    {
        let mut popped = 0;
        while popped < limit {
            let Some(value) = self.pop() else {
                break;
            };
            sink(value);
            popped += 1;
        }
        popped
    }

    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.buffer().capacity()
    }

    /// Returns `true` if the producer has been dropped.
    ///
    /// Note: This may return a stale value; the producer could be dropped
    /// immediately after this returns `false`.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.ring.is_producer_dropped()
    }

    /// Returns the number of elements currently in the queue.
    ///
    /// Note: This is a snapshot and may be immediately stale in concurrent contexts.
    #[inline]
    pub fn len(&self) -> usize {
        size::size(&*self.ring)
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        size::is_empty(&*self.ring)
    }

    /// Returns a read-only view of the queue that can be shared freely.
    pub fn monitor(&self) -> Monitor<T> {
        Monitor {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<T> ProgressIndicators for Consumer<T> {
    #[inline]
    fn current_producer_index(&self) -> u64 {
        self.ring.load_producer_index()
    }

    #[inline]
    fn current_consumer_index(&self) -> u64 {
        self.ring.load_consumer_index()
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.ring.set_consumer_dropped();
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("consumer_index", &self.consumer_index)
            .field("disconnected", &self.is_disconnected())
            .finish_non_exhaustive()
    }
}

/// Read-only view of an SPSC queue.
///
/// Can be cloned and shared across any number of threads. Holding a monitor
/// keeps the queue's storage (and any undelivered elements) alive.
pub struct Monitor<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Monitor<T> {
    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.buffer().capacity()
    }

    /// Returns the number of elements currently in the queue.
    ///
    /// Note: This is a snapshot and may be immediately stale in concurrent contexts.
    #[inline]
    pub fn len(&self) -> usize {
        size::size(&*self.ring)
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        size::is_empty(&*self.ring)
    }
}

impl<T> Clone for Monitor<T> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<T> ProgressIndicators for Monitor<T> {
    #[inline]
    fn current_producer_index(&self) -> u64 {
        self.ring.load_producer_index()
    }

    #[inline]
    fn current_consumer_index(&self) -> u64 {
        self.ring.load_consumer_index()
    }
}

impl<T> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("capacity", &self.capacity())
            .field("producer_index", &self.current_producer_index())
            .field("consumer_index", &self.current_consumer_index())
            .finish()
    }
}
