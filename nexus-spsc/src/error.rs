use std::fmt;

/// Error returned by [`Producer::push`](crate::spsc::Producer::push) when the
/// queue is full.
///
/// Contains the value that could not be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// Error returned by [`spsc::channel`](crate::spsc::channel) when the
/// requested capacity cannot be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// A capacity of zero was requested.
    Zero,
    /// The capacity, once rounded up to a power of two, exceeds the maximum.
    TooLarge {
        /// The capacity that was asked for.
        requested: usize,
        /// The largest supported capacity.
        max: usize,
    },
}

impl CapacityError {
    /// Returns `true` if this error is the `Zero` variant.
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Zero)
    }

    /// Returns `true` if this error is the `TooLarge` variant.
    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "capacity must be non-zero"),
            Self::TooLarge { requested, max } => {
                write!(f, "capacity {requested} exceeds maximum of {max}")
            }
        }
    }
}

impl std::error::Error for CapacityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_returns_value() {
        let err = Full(String::from("payload"));
        assert_eq!(err.to_string(), "queue is full");
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn capacity_error_display() {
        assert_eq!(CapacityError::Zero.to_string(), "capacity must be non-zero");

        let err = CapacityError::TooLarge {
            requested: 10,
            max: 8,
        };
        assert_eq!(err.to_string(), "capacity 10 exceeds maximum of 8");
        assert!(err.is_too_large());
        assert!(!err.is_zero());
    }
}
