//! # nexus-spsc
//!
//! Wait-free single-producer single-consumer bounded queue for handing work
//! from exactly one thread to exactly one other thread, designed for
//! trading systems and other latency-sensitive pipelines.
//!
//! ## Features
//!
//! - **Wait-free**: push, pop and peek finish in a bounded number of steps
//! - **No CAS**: only acquire/release loads and stores, each counter has one writer
//! - **Look-ahead**: the producer checks for free space once per batch of
//!   slots instead of once per push
//! - **Statically SPSC**: one [`Producer`](spsc::Producer) and one
//!   [`Consumer`](spsc::Consumer), neither `Clone` nor `Sync`
//!
//! ## Design Goals
//!
//! - Sub-microsecond latency on the hot path
//! - No allocations after construction
//! - Cache-line isolation of the producer and consumer counters
//!
//! ## Example
//!
//! ```
//! use nexus_spsc::spsc;
//!
//! // Create a queue with capacity for 1024 elements
//! // (will be rounded up to next power of two)
//! let (mut tx, mut rx) = spsc::channel::<u64>(1024).unwrap();
//!
//! // Push a value
//! tx.push(42).unwrap();
//!
//! // Pop the value
//! assert_eq!(rx.pop(), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
mod error;
mod size;
pub mod spsc;
mod sync;

pub use error::{CapacityError, Full};
pub use spsc::ProgressIndicators;
