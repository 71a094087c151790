//! TLS indices with `TlsAlloc`/`TlsGetValue`/`TlsSetValue`/`TlsFree`
//! semantics, plus the process-wide thread-detach callback the native API
//! offers through the loader.
//!
//! Each thread keeps its values in a plain heap vector reached through a
//! const-initialised thread local with no destructor, so it stays usable
//! while other thread locals are being torn down. A separate guard thread
//! local runs the detach hook and then frees the vector.

use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use once_cell::sync::OnceCell;

/// Indices a process can hold at once.
pub const TLS_MAX_INDICES: usize = 1088;

/// An allocated TLS index. Stale copies of a freed index read as null and
/// refuse writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TlsIndex {
    slot: u32,
    generation: u64,
}

impl TlsIndex {
    pub fn slot(&self) -> u32 {
        self.slot
    }
}

static GENERATIONS: [AtomicU64; TLS_MAX_INDICES] = [const { AtomicU64::new(0) }; TLS_MAX_INDICES];
static IN_USE: Mutex<Vec<bool>> = Mutex::new(Vec::new());
static DETACH_HOOK: OnceCell<fn()> = OnceCell::new();

type Slots = Vec<(u64, *mut c_void)>;

struct ThreadDetach;

impl Drop for ThreadDetach {
    fn drop(&mut self) {
        if let Some(hook) = DETACH_HOOK.get() {
            hook();
        }
        let _ = SLOTS.try_with(|slots| {
            let raw = slots.replace(ptr::null_mut());
            if !raw.is_null() {
                // SAFETY: allocated by Box::into_raw in tls_set and owned by
                // this thread alone.
                drop(unsafe { Box::from_raw(raw) });
            }
        });
    }
}

thread_local! {
    static SLOTS: Cell<*mut Slots> = const { Cell::new(ptr::null_mut()) };
    static DETACH: ThreadDetach = const { ThreadDetach };
}

fn is_live(index: TlsIndex) -> bool {
    GENERATIONS
        .get(index.slot as usize)
        .is_some_and(|g| g.load(Ordering::Acquire) == index.generation)
}

/// Reserve an index. `None` once all indices are taken.
pub fn tls_alloc() -> Option<TlsIndex> {
    let mut in_use = IN_USE.lock().unwrap_or_else(|p| p.into_inner());
    let slot = match in_use.iter().position(|used| !used) {
        Some(slot) => slot,
        None if in_use.len() < TLS_MAX_INDICES => {
            in_use.push(false);
            in_use.len() - 1
        }
        None => return None,
    };
    in_use[slot] = true;
    let generation = GENERATIONS[slot].fetch_add(1, Ordering::AcqRel) + 1;
    Some(TlsIndex {
        slot: slot as u32,
        generation,
    })
}

/// Release an index. Values any thread stored under it become
/// unreachable.
pub fn tls_free(index: TlsIndex) -> bool {
    let mut in_use = IN_USE.lock().unwrap_or_else(|p| p.into_inner());
    let slot = index.slot as usize;
    if !is_live(index) || !in_use.get(slot).copied().unwrap_or(false) {
        return false;
    }
    GENERATIONS[slot].fetch_add(1, Ordering::AcqRel);
    in_use[slot] = false;
    true
}

/// Calling thread's value for `index`, null if never set.
pub fn tls_get(index: TlsIndex) -> *mut c_void {
    if !is_live(index) {
        return ptr::null_mut();
    }
    SLOTS
        .try_with(|slots| {
            let raw = slots.get();
            if raw.is_null() {
                return ptr::null_mut();
            }
            // SAFETY: the vector belongs to this thread and no reference to
            // it outlives this call.
            let slots = unsafe { &*raw };
            match slots.get(index.slot as usize) {
                Some(&(generation, value)) if generation == index.generation => value,
                _ => ptr::null_mut(),
            }
        })
        .unwrap_or(ptr::null_mut())
}

/// Store the calling thread's value for `index`.
pub fn tls_set(index: TlsIndex, value: *mut c_void) -> bool {
    if !is_live(index) {
        return false;
    }
    SLOTS
        .try_with(|slots| {
            let mut raw = slots.get();
            if raw.is_null() {
                raw = Box::into_raw(Box::new(Slots::new()));
                slots.set(raw);
                // Registers the detach guard for this thread
                let _ = DETACH.try_with(|_| {});
            }
            // SAFETY: as in tls_get.
            let slots = unsafe { &mut *raw };
            let slot = index.slot as usize;
            if slots.len() <= slot {
                slots.resize(slot + 1, (0, ptr::null_mut()));
            }
            slots[slot] = (index.generation, value);
            true
        })
        .unwrap_or(false)
}

/// Install the callback run on every thread that stored a TLS value, just
/// before the thread's values are released. Only the first call has an
/// effect.
pub fn set_thread_detach_hook(hook: fn()) -> bool {
    DETACH_HOOK.set(hook).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn value(n: usize) -> *mut c_void {
        n as *mut c_void
    }

    #[test]
    fn test_unset_value_is_null() {
        let index = tls_alloc().unwrap();
        assert!(tls_get(index).is_null());
        assert!(tls_free(index));
    }

    #[test]
    fn test_values_are_per_thread() {
        let index = tls_alloc().unwrap();
        assert!(tls_set(index, value(11)));
        let seen = thread::spawn(move || {
            let before = tls_get(index) as usize;
            tls_set(index, value(22));
            (before, tls_get(index) as usize)
        })
        .join()
        .unwrap();
        assert_eq!(seen, (0, 22));
        assert_eq!(tls_get(index), value(11));
        tls_free(index);
    }

    #[test]
    fn test_freed_index_reads_null_and_refuses_writes() {
        let index = tls_alloc().unwrap();
        tls_set(index, value(5));
        assert!(tls_free(index));
        assert!(tls_get(index).is_null());
        assert!(!tls_set(index, value(6)));
        assert!(!tls_free(index));
    }
}
