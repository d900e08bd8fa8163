//! Queue length estimation from two independently advancing counters.
//!
//! The producer and consumer indices cannot be read atomically as a pair.
//! [`size`] retries until the consumer index is stable across a producer
//! read, which bounds the result to a single instant between the reads. The
//! result is still only an estimate under concurrent mutation.

/// A queue whose occupancy is described by two monotonic counters.
pub(crate) trait IndexedQueue {
    /// Total number of elements ever inserted.
    fn producer_index(&self) -> u64;

    /// Total number of elements ever removed.
    fn consumer_index(&self) -> u64;

    fn capacity(&self) -> usize;
}

/// Returns `producer - consumer`, clamped to `[0, capacity]`.
pub(crate) fn size<Q: IndexedQueue + ?Sized>(queue: &Q) -> usize {
    let mut after = queue.consumer_index();

    let len = loop {
        let before = after;
        let producer = queue.producer_index();
        after = queue.consumer_index();
        if before == after {
            break producer.saturating_sub(after);
        }
    };

    let capacity = queue.capacity();
    usize::try_from(len).map_or(capacity, |len| len.min(capacity))
}

/// Returns `true` if the consumer has caught up with the producer.
///
/// Reads the consumer index before the producer index, so the producer value
/// is never older than the consumer value it is compared against.
pub(crate) fn is_empty<Q: IndexedQueue + ?Sized>(queue: &Q) -> bool {
    queue.consumer_index() >= queue.producer_index()
}
