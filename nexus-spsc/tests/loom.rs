//! Exhaustive interleaving checks for the SPSC queue.
//!
//! Run with:
//!
//! ```text
//! RUSTFLAGS="--cfg loom" cargo test -p nexus-spsc --test loom --release
//! ```
//!
//! Keep capacities at the minimum (4) and message counts low; loom explores
//! exponentially many interleavings.

#![cfg(loom)]

use loom::sync::Arc;
use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::thread;
use nexus_spsc::spsc;

#[test]
fn loom_fifo() {
    loom::model(|| {
        let (mut tx, mut rx) = spsc::with_capacity::<u32>(4);

        let producer = thread::spawn(move || {
            for i in 0..3 {
                while tx.push(i).is_err() {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::new();
        while received.len() < 3 {
            match rx.pop() {
                Some(v) => received.push(v),
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert_eq!(received, vec![0, 1, 2]);
        assert_eq!(rx.pop(), None);
    });
}

#[test]
fn loom_wraparound_when_full() {
    loom::model(|| {
        let (mut tx, mut rx) = spsc::with_capacity::<u32>(4);

        // Pre-fill so the producer races the consumer for a freed slot.
        for i in 0..4 {
            tx.push(i).unwrap();
        }

        let producer = thread::spawn(move || {
            while tx.push(4).is_err() {
                thread::yield_now();
            }
        });

        assert_eq!(rx.pop(), Some(0));

        let mut rest = Vec::new();
        while rest.len() < 4 {
            match rx.pop() {
                Some(v) => rest.push(v),
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert_eq!(rest, vec![1, 2, 3, 4]);
    });
}

#[test]
fn loom_peek_sees_published_value() {
    loom::model(|| {
        let (mut tx, mut rx) = spsc::with_capacity::<String>(4);

        let producer = thread::spawn(move || {
            tx.push("hello".to_string()).unwrap();
        });

        loop {
            if let Some(v) = rx.peek() {
                assert_eq!(v, "hello");
                break;
            }
            thread::yield_now();
        }
        assert_eq!(rx.pop().as_deref(), Some("hello"));

        producer.join().unwrap();
    });
}

#[test]
fn loom_undelivered_dropped_once() {
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    loom::model(|| {
        let drops = Arc::new(AtomicUsize::new(0));
        let (mut tx, mut rx) = spsc::with_capacity::<Tracked>(4);

        let counter = Arc::clone(&drops);
        let producer = thread::spawn(move || {
            let _ = tx.push(Tracked(Arc::clone(&counter)));
            let _ = tx.push(Tracked(counter));
        });

        let consumer = thread::spawn(move || {
            drop(rx.pop());
        });

        producer.join().unwrap();
        consumer.join().unwrap();

        assert_eq!(drops.load(Ordering::Relaxed), 2);
    });
}
