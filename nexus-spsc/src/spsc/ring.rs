//! Shared state behind the producer, consumer and monitor handles.

use crossbeam_utils::CachePadded;

use super::buffer::SlotBuffer;
use crate::size::IndexedQueue;
use crate::sync::{AtomicBool, AtomicU64, Ordering};

/// The backing storage for an SPSC queue.
///
/// Memory layout:
/// ```text
/// ┌───────────────────────────────────────────────────────┐
/// │ producer_index (cache-line padded) - total inserted   │
/// ├───────────────────────────────────────────────────────┤
/// │ consumer_index (cache-line padded) - total removed    │
/// ├───────────────────────────────────────────────────────┤
/// │ Slots: [{ occupied, T }; capacity]                    │
/// └───────────────────────────────────────────────────────┘
/// ```
///
/// Queue contains elements in range [consumer_index, producer_index).
/// - Producer publishes the slot, then advances producer_index
/// - Consumer clears the slot, then advances consumer_index
pub(crate) struct Ring<T> {
    // === Hot path data ===
    /// Written only by the producer.
    producer_index: CachePadded<AtomicU64>,
    /// Written only by the consumer.
    consumer_index: CachePadded<AtomicU64>,

    buffer: SlotBuffer<T>,

    // === Disconnect flags (never touched on the hot path) ===
    producer_dropped: AtomicBool,
    consumer_dropped: AtomicBool,
}

// Safety: elements move between threads (T: Send). Slots are handed off
// through the occupancy flags; the handles enforce one producer and one
// consumer.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            producer_index: CachePadded::new(AtomicU64::new(0)),
            consumer_index: CachePadded::new(AtomicU64::new(0)),
            buffer: SlotBuffer::new(capacity),
            producer_dropped: AtomicBool::new(false),
            consumer_dropped: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    pub(crate) fn buffer(&self) -> &SlotBuffer<T> {
        &self.buffer
    }

    // === Index operations ===

    #[inline(always)]
    pub(crate) fn load_producer_index(&self) -> u64 {
        self.producer_index.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn load_consumer_index(&self) -> u64 {
        self.consumer_index.load(Ordering::Acquire)
    }

    /// Publishes a new producer index. Producer only.
    #[inline(always)]
    pub(crate) fn publish_producer_index(&self, index: u64) {
        self.producer_index.store(index, Ordering::Release);
    }

    /// Publishes a new consumer index. Consumer only.
    #[inline(always)]
    pub(crate) fn publish_consumer_index(&self, index: u64) {
        self.consumer_index.store(index, Ordering::Release);
    }

    // === Disconnect operations ===

    #[inline]
    pub(crate) fn is_producer_dropped(&self) -> bool {
        self.producer_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_consumer_dropped(&self) -> bool {
        self.consumer_dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn set_producer_dropped(&self) {
        self.producer_dropped.store(true, Ordering::Release);
    }

    pub(crate) fn set_consumer_dropped(&self) {
        self.consumer_dropped.store(true, Ordering::Release);
    }
}

impl<T> IndexedQueue for Ring<T> {
    #[inline]
    fn producer_index(&self) -> u64 {
        self.load_producer_index()
    }

    #[inline]
    fn consumer_index(&self) -> u64 {
        self.load_consumer_index()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let remaining = self.buffer.occupied();
        if remaining > 0 {
            log::debug!(
                "dropping spsc queue with {remaining} undelivered element(s) (capacity {})",
                self.buffer.capacity()
            );
        }
        // SlotBuffer drops the elements themselves.
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_connected() {
        let ring = Ring::<u64>::new(16);

        assert_eq!(ring.load_producer_index(), 0);
        assert_eq!(ring.load_consumer_index(), 0);
        assert_eq!(IndexedQueue::capacity(&ring), 16);
        assert_eq!(ring.buffer().mask(), 15);
        assert!(!ring.is_producer_dropped());
        assert!(!ring.is_consumer_dropped());
    }

    #[test]
    fn published_indices_are_visible() {
        let ring = Ring::<u64>::new(8);

        ring.publish_producer_index(5);
        ring.publish_consumer_index(2);

        assert_eq!(crate::size::size(&ring), 3);
        assert!(!crate::size::is_empty(&ring));
    }

    #[test]
    fn disconnect_flags() {
        let ring = Ring::<u64>::new(4);

        ring.set_producer_dropped();
        assert!(ring.is_producer_dropped());
        assert!(!ring.is_consumer_dropped());

        ring.set_consumer_dropped();
        assert!(ring.is_consumer_dropped());
    }
}
