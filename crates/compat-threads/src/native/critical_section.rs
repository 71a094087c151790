use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Recursive lock with `EnterCriticalSection` semantics.
///
/// Backed by a pthread recursive mutex on unix hosts. The mutex is set up
/// lazily on first use so the lock can live in a `static`. Once entered for
/// the first time it must not be moved; owners keep it boxed or static.
pub struct CriticalSection {
    inner: UnsafeCell<libc::pthread_mutex_t>,
    initialized: AtomicBool,
    init_lock: AtomicBool,
}

unsafe impl Send for CriticalSection {}
unsafe impl Sync for CriticalSection {}

impl CriticalSection {
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER),
            initialized: AtomicBool::new(false),
            init_lock: AtomicBool::new(false),
        }
    }

    fn ensure_init(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        // Spinlock to serialize initialization
        while self
            .init_lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }

        if !self.initialized.load(Ordering::Relaxed) {
            unsafe {
                let mut attr: libc::pthread_mutexattr_t = std::mem::zeroed();
                libc::pthread_mutexattr_init(&mut attr);
                libc::pthread_mutexattr_settype(&mut attr, libc::PTHREAD_MUTEX_RECURSIVE);
                libc::pthread_mutex_init(self.inner.get(), &attr);
                libc::pthread_mutexattr_destroy(&mut attr);
                self.initialized.store(true, Ordering::Release);
            }
        }

        self.init_lock.store(false, Ordering::Release);
    }

    /// Block until the calling thread owns the lock. Re-entry by the owner
    /// nests.
    pub fn enter(&self) {
        self.ensure_init();
        unsafe {
            libc::pthread_mutex_lock(self.inner.get());
        }
    }

    /// Take the lock if it is free or already owned by the caller.
    pub fn try_enter(&self) -> bool {
        self.ensure_init();
        unsafe { libc::pthread_mutex_trylock(self.inner.get()) == 0 }
    }

    /// Undo one `enter`. Returns `false` when the caller is not the owner.
    pub fn leave(&self) -> bool {
        if !self.initialized.load(Ordering::Acquire) {
            return false;
        }
        unsafe { libc::pthread_mutex_unlock(self.inner.get()) == 0 }
    }

    /// Scoped `enter`/`leave`.
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

impl Drop for CriticalSection {
    fn drop(&mut self) {
        if self.initialized.load(Ordering::Acquire) {
            unsafe {
                libc::pthread_mutex_destroy(self.inner.get());
            }
        }
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
