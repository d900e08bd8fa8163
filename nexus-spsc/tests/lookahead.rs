//! The look-ahead producer must be observationally identical to a queue that
//! checks for free space on every push.

#![cfg(not(loom))]

use std::collections::VecDeque;

use nexus_spsc::ProgressIndicators;
use nexus_spsc::spsc;
use proptest::prelude::*;

/// Bounded FIFO that checks occupancy on every push.
struct Naive {
    items: VecDeque<u32>,
    capacity: usize,
    pushed: u64,
    popped: u64,
}

impl Naive {
    fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            pushed: 0,
            popped: 0,
        }
    }

    fn push(&mut self, value: u32) -> bool {
        if self.items.len() == self.capacity {
            return false;
        }
        self.items.push_back(value);
        self.pushed += 1;
        true
    }

    fn pop(&mut self) -> Option<u32> {
        let value = self.items.pop_front()?;
        self.popped += 1;
        Some(value)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Pop,
    Peek,
    Fill(usize),
    Drain(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => Just(Op::Peek),
        1 => (0usize..12).prop_map(Op::Fill),
        1 => (0usize..12).prop_map(Op::Drain),
    ]
}

proptest! {
    #[test]
    fn matches_naive_queue(
        capacity in prop_oneof![Just(4usize), Just(8), Just(16), Just(32)],
        ops in proptest::collection::vec(op_strategy(), 0..600),
    ) {
        let (mut tx, mut rx) = spsc::with_capacity::<u32>(capacity);
        let mut model = Naive::new(capacity);
        let mut counter = 0u32;

        for op in &ops {
            match *op {
                Op::Push(v) => {
                    prop_assert_eq!(tx.push(v).is_ok(), model.push(v));
                }
                Op::Pop => {
                    prop_assert_eq!(rx.pop(), model.pop());
                }
                Op::Peek => {
                    prop_assert_eq!(rx.peek().copied(), model.items.front().copied());
                }
                Op::Fill(limit) => {
                    let mut expected = 0;
                    for i in 0..limit {
                        let value = counter.wrapping_add(u32::try_from(i).unwrap());
                        if !model.push(value) {
                            break;
                        }
                        expected += 1;
                    }
                    let pushed = tx.fill(
                        || {
                            let v = counter;
                            counter = counter.wrapping_add(1);
                            v
                        },
                        limit,
                    );
                    prop_assert_eq!(pushed, expected);
                }
                Op::Drain(limit) => {
                    let mut got = Vec::new();
                    rx.drain(|v| got.push(v), limit);
                    let want: Vec<u32> = (0..limit).map_while(|_| model.pop()).collect();
                    prop_assert_eq!(got, want);
                }
            }

            prop_assert_eq!(rx.len(), model.items.len());
            prop_assert_eq!(rx.is_empty(), model.items.is_empty());
            prop_assert_eq!(tx.current_producer_index(), model.pushed);
            prop_assert_eq!(rx.current_consumer_index(), model.popped);
        }

        while let Some(expected) = model.pop() {
            prop_assert_eq!(rx.pop(), Some(expected));
        }
        prop_assert_eq!(rx.pop(), None);
    }
}

/// Capacity 8 gives a look-ahead step of 2. Bursts of pushes and pops with
/// coprime lengths make the look-ahead slot alternate between free and taken.
#[test]
fn alternating_look_ahead_outcomes() {
    let (mut tx, mut rx) = spsc::with_capacity::<u32>(8);
    assert_eq!(tx.look_ahead_step(), 2);

    let mut model = Naive::new(8);
    let mut outcomes = Vec::new();
    let mut expected_outcomes = Vec::new();
    let mut next = 0u32;

    for round in 0..500u32 {
        for _ in 0..(round % 3 + 1) {
            outcomes.push(tx.push(next).is_ok());
            expected_outcomes.push(model.push(next));
            next += 1;
        }
        for _ in 0..(round % 4) {
            assert_eq!(rx.pop(), model.pop());
        }
    }

    assert_eq!(outcomes, expected_outcomes);
    assert!(outcomes.iter().any(|ok| !ok), "queue never filled up");
}
