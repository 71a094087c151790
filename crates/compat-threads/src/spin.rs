//! Bounded polling loops with a cooperative yield between attempts.
//!
//! These stand in for blocking primitives the native API lacks (a timed
//! critical-section enter, a blocking once-flag). Keeping them here gives a
//! platform backend with real timed waits a single place to swap in.

use std::thread;

use crate::time::Timespec;

/// Retry `attempt` until it succeeds or the wall clock reaches `deadline`.
/// The clock is re-read on every pass. Returns whether `attempt`
/// succeeded.
pub fn spin_until_deadline(deadline: &Timespec, mut attempt: impl FnMut() -> bool) -> bool {
    loop {
        if attempt() {
            return true;
        }
        if Timespec::now() >= *deadline {
            return false;
        }
        thread::yield_now();
    }
}

/// Yield until `busy` reports false.
pub fn spin_while(busy: impl Fn() -> bool) {
    while busy() {
        thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_succeeds_without_waiting() {
        let deadline = Timespec::new(0, 0);
        assert!(spin_until_deadline(&deadline, || true));
    }

    #[test]
    fn test_gives_up_at_deadline() {
        let start = Instant::now();
        let deadline = Timespec::after(Duration::from_millis(30));
        assert!(!spin_until_deadline(&deadline, || false));
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_eventual_success() {
        let mut tries = 0;
        let deadline = Timespec::after(Duration::from_secs(5));
        assert!(spin_until_deadline(&deadline, || {
            tries += 1;
            tries == 10
        }));
        assert_eq!(tries, 10);
    }

    #[test]
    fn test_spin_while() {
        let remaining = std::cell::Cell::new(3);
        spin_while(|| {
            remaining.set(remaining.get() - 1);
            remaining.get() > 0
        });
        assert_eq!(remaining.get(), 0);
    }
}
