use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

struct Owner {
    thread: Option<ThreadId>,
    depth: usize,
}

/// Recursive lock with `EnterCriticalSection` semantics, built on std
/// primitives for hosts without pthreads.
pub struct CriticalSection {
    owner: Mutex<Owner>,
    released: Condvar,
}

impl CriticalSection {
    pub const fn new() -> Self {
        Self {
            owner: Mutex::new(Owner {
                thread: None,
                depth: 0,
            }),
            released: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, Owner> {
        self.owner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn enter(&self) {
        let me = thread::current().id();
        let mut owner = self.state();
        while owner.thread.is_some_and(|t| t != me) {
            owner = self
                .released
                .wait(owner)
                .unwrap_or_else(|p| p.into_inner());
        }
        owner.thread = Some(me);
        owner.depth += 1;
    }

    pub fn try_enter(&self) -> bool {
        let me = thread::current().id();
        let mut owner = self.state();
        match owner.thread {
            Some(t) if t != me => false,
            _ => {
                owner.thread = Some(me);
                owner.depth += 1;
                true
            }
        }
    }

    pub fn leave(&self) -> bool {
        let me = thread::current().id();
        let mut owner = self.state();
        if owner.thread != Some(me) {
            return false;
        }
        owner.depth -= 1;
        if owner.depth == 0 {
            owner.thread = None;
            self.released.notify_one();
        }
        true
    }

    pub fn lock(&self) -> CriticalSectionGuard<'_> {
        self.enter();
        CriticalSectionGuard { section: self }
    }
}

impl std::fmt::Debug for CriticalSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriticalSection").finish_non_exhaustive()
    }
}

impl Default for CriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CriticalSectionGuard<'a> {
    section: &'a CriticalSection,
}

impl Drop for CriticalSectionGuard<'_> {
    fn drop(&mut self) {
        self.section.leave();
    }
}
