//! Process-wide tuning.
//!
//! The only knob is the upper bound on the producer's look-ahead step. It is
//! read once from the environment the first time a queue is built and cached
//! for the life of the process:
//!
//! ```text
//! NEXUS_SPSC_MAX_LOOKAHEAD_STEP=1024 ./my-binary
//! ```
//!
//! Each queue then uses `min(capacity / 4, max_look_ahead_step())`.

use std::sync::OnceLock;

/// Look-ahead bound used when the environment does not override it.
pub const DEFAULT_MAX_LOOK_AHEAD_STEP: u64 = 4096;

/// Environment variable overriding [`DEFAULT_MAX_LOOK_AHEAD_STEP`].
pub const MAX_LOOK_AHEAD_STEP_ENV: &str = "NEXUS_SPSC_MAX_LOOKAHEAD_STEP";

/// Returns the process-wide maximum look-ahead step.
///
/// The environment is consulted only on the first call.
pub fn max_look_ahead_step() -> u64 {
    static MAX: OnceLock<u64> = OnceLock::new();

    *MAX.get_or_init(|| {
        let raw = std::env::var(MAX_LOOK_AHEAD_STEP_ENV).ok();
        parse_max_look_ahead_step(raw.as_deref())
    })
}

/// Parses an override for the maximum look-ahead step.
///
/// `None` yields the default. Values that are not positive integers are
/// rejected with a warning and also yield the default.
pub fn parse_max_look_ahead_step(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_MAX_LOOK_AHEAD_STEP;
    };

    match raw.trim().parse::<u64>() {
        Ok(step) if step > 0 => step,
        _ => {
            log::warn!(
                "ignoring {MAX_LOOK_AHEAD_STEP_ENV}={raw:?}: expected a positive integer, \
                 using {DEFAULT_MAX_LOOK_AHEAD_STEP}"
            );
            DEFAULT_MAX_LOOK_AHEAD_STEP
        }
    }
}

/// Look-ahead step for a queue of `capacity` slots. Never below 1.
#[inline]
pub(crate) fn look_ahead_step(capacity: usize, max: u64) -> u64 {
    (capacity as u64 / 4).min(max).max(1)
}
