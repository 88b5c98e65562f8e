//! # Fibonacci Backoff
//!
//! Progressive retry delay for bindings whose reconciliation keeps failing.
//! Grows more slowly than exponential backoff.
//!
//! Sequence for `FibonacciBackoff::new(5, 300)`: 5s, 5s, 10s, 15s, 25s, 40s,
//! 65s, 105s, 170s, 275s, 300s (max).
//!
//! ```rust
//! use reverse_vault_secret_controller::controller::backoff::FibonacciBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = FibonacciBackoff::new(5, 300);
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator, in seconds
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    prev_secs: u64,
    current_secs: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    /// `min_secs` is used for the first two steps, `max_secs` caps the sequence
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let min_secs = min_secs.max(1);
        Self {
            prev_secs: 0,
            current_secs: min_secs,
            max_secs: max_secs.max(min_secs),
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next.min(self.max_secs);
        result
    }

    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }
}
