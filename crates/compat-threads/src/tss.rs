//! Thread-specific storage with destructors.
//!
//! TLS indices carry no destructor of their own, so keys created with one
//! are recorded in a process-wide registry. A thread-detach hook walks the
//! registry when a thread exits, calling the destructor of every key that
//! still holds a value. A destructor may store new values, so the walk is
//! repeated up to `threads.tss_dtor_iterations` passes; values left after
//! the last pass are abandoned.

use std::cell::UnsafeCell;
use std::ffi::c_void;
use std::process;
use std::ptr;

use compat_config::{log_threads_debug, log_threads_error, log_threads_warn, TSS_REGISTRY_MAX};

use crate::error::{Result, Status, ThrdError};
use crate::native::{set_thread_detach_hook, tls_alloc, tls_free, tls_get, tls_set, CriticalSection, TlsIndex};

/// Destructor run at thread exit on a key's non-null value.
pub type TssDtor = fn(*mut c_void);

/// Default number of destructor passes at thread exit.
pub const TSS_DTOR_ITERATIONS: usize = 4;

#[derive(Clone, Copy)]
struct Entry {
    index: TlsIndex,
    dtor: TssDtor,
}

struct Registry {
    lock: CriticalSection,
    entries: UnsafeCell<Vec<Entry>>,
}

// SAFETY: `entries` is only reached through `Registry::with`, which holds
// `lock`.
unsafe impl Sync for Registry {}

static REGISTRY: Registry = Registry {
    lock: CriticalSection::new(),
    entries: UnsafeCell::new(Vec::new()),
};

impl Registry {
    /// Run `f` on the entries with the lock held. `f` must not call back
    /// into the registry.
    fn with<R>(&self, f: impl FnOnce(&mut Vec<Entry>) -> R) -> R {
        let _guard = self.lock.lock();
        // SAFETY: the lock is held and `f` does not re-enter.
        f(unsafe { &mut *self.entries.get() })
    }

    fn register(&self, entry: Entry, capacity: usize) -> Result<()> {
        self.with(|entries| {
            // The backing buffer is sized once and never shrinks
            if entries.capacity() == 0 && entries.try_reserve_exact(TSS_REGISTRY_MAX).is_err() {
                return Err(ThrdError::NoMem);
            }
            if entries.len() >= capacity {
                log_threads_warn!("Destructor registry full", capacity = capacity);
                return Err(ThrdError::Error);
            }
            entries.push(entry);
            Ok(())
        })
    }

    fn unregister(&self, index: TlsIndex) {
        self.with(|entries| {
            if let Some(pos) = entries.iter().position(|e| e.index == index) {
                entries.remove(pos);
            }
        });
    }

    fn snapshot(&self) -> Vec<Entry> {
        self.with(|entries| {
            if entries.len() > TSS_REGISTRY_MAX {
                log_threads_error!("Destructor registry overran its capacity", len = entries.len());
                process::abort();
            }
            entries.clone()
        })
    }
}

/// Thread-detach hook: run destructors for the exiting thread.
fn run_destructors() {
    let iterations = compat_config::config().threads.tss_dtor_iterations;
    for _ in 0..iterations {
        let mut ran = false;
        for entry in REGISTRY.snapshot() {
            let value = tls_get(entry.index);
            if !value.is_null() {
                tls_set(entry.index, ptr::null_mut());
                (entry.dtor)(value);
                ran = true;
            }
        }
        if !ran {
            return;
        }
    }
    let abandoned = REGISTRY
        .snapshot()
        .iter()
        .filter(|e| !tls_get(e.index).is_null())
        .count();
    if abandoned > 0 {
        log_threads_debug!("Destructor passes exhausted", iterations = iterations, abandoned = abandoned);
    }
}

/// A thread-specific storage key. Copies name the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tss {
    index: TlsIndex,
}

impl Tss {
    /// Allocate a key whose per-thread values start out null. With a
    /// destructor, the key is also registered for thread-exit cleanup.
    pub fn create(dtor: Option<TssDtor>) -> Result<Self> {
        let index = tls_alloc().ok_or_else(|| ThrdError::Error.record())?;
        let Some(dtor) = dtor else {
            return Ok(Self { index });
        };

        set_thread_detach_hook(run_destructors);
        let capacity = compat_config::config().threads.effective_tss_capacity();
        if let Err(err) = REGISTRY.register(Entry { index, dtor }, capacity) {
            tls_free(index);
            return Err(err.record());
        }
        Ok(Self { index })
    }

    /// Release the key. Destructors are not run for values still stored.
    pub fn delete(self) {
        REGISTRY.unregister(self.index);
        tls_free(self.index);
    }

    pub fn set(&self, value: *mut c_void) -> Result<()> {
        if tls_set(self.index, value) {
            Ok(())
        } else {
            Err(ThrdError::Error.record())
        }
    }

    /// Calling thread's value, null if none.
    pub fn get(&self) -> *mut c_void {
        tls_get(self.index)
    }
}

pub fn tss_create(key: &mut Option<Tss>, dtor: Option<TssDtor>) -> i32 {
    match Tss::create(dtor) {
        Ok(created) => {
            *key = Some(created);
            Status::Success.code()
        }
        Err(err) => err.status().code(),
    }
}

pub fn tss_delete(key: Tss) {
    key.delete();
}

pub fn tss_set(key: Tss, value: *mut c_void) -> i32 {
    Status::from(key.set(value)).code()
}

pub fn tss_get(key: Tss) -> *mut c_void {
    key.get()
}
