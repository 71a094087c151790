//! Kernel-object style semaphores and events that can be waited on
//! together, in the manner of `WaitForMultipleObjects`.
//!
//! Objects that take part in one multi-object wait must share a
//! [`WaitDomain`]. Their state only changes while the domain lock is held,
//! so a waiter checking several objects sees one consistent snapshot.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Wait without a time limit.
pub const INFINITE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Infinite,
    Millis(u32),
}

impl Timeout {
    /// Interpret a raw millisecond count, `INFINITE` included.
    pub fn from_millis(ms: u32) -> Self {
        if ms == INFINITE {
            Timeout::Infinite
        } else {
            Timeout::Millis(ms)
        }
    }

    fn deadline(self, start: Instant) -> Option<Instant> {
        match self {
            Timeout::Infinite => None,
            Timeout::Millis(ms) => Some(start + Duration::from_millis(ms as u64)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// Index of the object that was acquired.
    Object(usize),
    TimedOut,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("semaphore count would exceed its maximum")]
pub struct TooManyPosts;

/// Lock and wake-up channel shared by a group of waitable objects.
#[derive(Debug, Default)]
pub struct WaitDomain {
    lock: Mutex<()>,
    changed: Condvar,
}

impl WaitDomain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Something [`wait_any`] can acquire.
pub trait Waitable {
    fn domain(&self) -> &Arc<WaitDomain>;

    /// Take the object if it is signaled. Called with the domain lock held.
    fn try_acquire(&self) -> bool;
}

/// Counting semaphore with an upper bound, like `CreateSemaphore`.
#[derive(Debug)]
pub struct Semaphore {
    domain: Arc<WaitDomain>,
    count: AtomicU32,
    max: u32,
}

impl Semaphore {
    /// `None` when `initial` exceeds `max`.
    pub fn new(initial: u32, max: u32) -> Option<Self> {
        Self::in_domain(&WaitDomain::new(), initial, max)
    }

    pub fn in_domain(domain: &Arc<WaitDomain>, initial: u32, max: u32) -> Option<Self> {
        if initial > max {
            return None;
        }
        Some(Self {
            domain: Arc::clone(domain),
            count: AtomicU32::new(initial),
            max,
        })
    }

    /// Add `n` to the count and return the previous count.
    pub fn release(&self, n: u32) -> Result<u32, TooManyPosts> {
        let _guard = self.domain.lock();
        let previous = self.count.load(Ordering::Relaxed);
        if n > self.max - previous {
            return Err(TooManyPosts);
        }
        self.count.store(previous + n, Ordering::Relaxed);
        self.domain.changed.notify_all();
        Ok(previous)
    }

    pub fn wait(&self, timeout: Timeout) -> WaitStatus {
        wait_any(&[self as &dyn Waitable], timeout)
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Waitable for Semaphore {
    fn domain(&self) -> &Arc<WaitDomain> {
        &self.domain
    }

    fn try_acquire(&self) -> bool {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return false;
        }
        self.count.store(count - 1, Ordering::Relaxed);
        true
    }
}

/// Event object, like `CreateEvent`. A manual-reset event stays signaled
/// until [`reset`](Event::reset); an auto-reset one releases a single
/// waiter and clears itself.
#[derive(Debug)]
pub struct Event {
    domain: Arc<WaitDomain>,
    signaled: AtomicBool,
    manual_reset: bool,
}

impl Event {
    pub fn new(manual_reset: bool, initial: bool) -> Self {
        Self::in_domain(&WaitDomain::new(), manual_reset, initial)
    }

    pub fn in_domain(domain: &Arc<WaitDomain>, manual_reset: bool, initial: bool) -> Self {
        Self {
            domain: Arc::clone(domain),
            signaled: AtomicBool::new(initial),
            manual_reset,
        }
    }

    pub fn set(&self) {
        let _guard = self.domain.lock();
        self.signaled.store(true, Ordering::Relaxed);
        self.domain.changed.notify_all();
    }

    pub fn reset(&self) {
        let _guard = self.domain.lock();
        self.signaled.store(false, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        let _guard = self.domain.lock();
        self.signaled.load(Ordering::Relaxed)
    }

    pub fn wait(&self, timeout: Timeout) -> WaitStatus {
        wait_any(&[self as &dyn Waitable], timeout)
    }
}

impl Waitable for Event {
    fn domain(&self) -> &Arc<WaitDomain> {
        &self.domain
    }

    fn try_acquire(&self) -> bool {
        if !self.signaled.load(Ordering::Relaxed) {
            return false;
        }
        if !self.manual_reset {
            self.signaled.store(false, Ordering::Relaxed);
        }
        true
    }
}

/// Block until one of `objects` can be acquired or `timeout` elapses.
///
/// Objects are tried in order, so when several are signaled the lowest
/// index wins. All objects must belong to the same [`WaitDomain`].
pub fn wait_any(objects: &[&dyn Waitable], timeout: Timeout) -> WaitStatus {
    let Some(first) = objects.first() else {
        return WaitStatus::TimedOut;
    };
    let domain = first.domain();
    debug_assert!(objects.iter().all(|o| Arc::ptr_eq(o.domain(), domain)));

    let deadline = timeout.deadline(Instant::now());
    let mut guard = domain.lock();
    loop {
        if let Some(index) = objects.iter().position(|o| o.try_acquire()) {
            return WaitStatus::Object(index);
        }
        guard = match deadline {
            None => domain
                .changed
                .wait(guard)
                .unwrap_or_else(|p| p.into_inner()),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return WaitStatus::TimedOut;
                }
                domain
                    .changed
                    .wait_timeout(guard, deadline - now)
                    .unwrap_or_else(|p| p.into_inner())
                    .0
            }
        };
    }
}
