use std::sync::atomic::{AtomicU32, Ordering};

use crate::spin::spin_while;

const UNSTARTED: u32 = 0;
const RUNNING: u32 = 1;
const DONE: u32 = 2;

/// C11 `once_flag`.
#[derive(Debug, Default)]
pub struct OnceFlag {
    state: AtomicU32,
}

impl OnceFlag {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNSTARTED),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }
}

#[allow(clippy::declare_interior_mutable_const)]
pub const ONCE_FLAG_INIT: OnceFlag = OnceFlag::new();

/// Puts the flag back to unstarted if `func` unwinds, so a later caller
/// can run it.
struct ResetOnUnwind<'a>(&'a AtomicU32);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(UNSTARTED, Ordering::Release);
    }
}

/// Run `func` exactly once across all callers sharing `flag`.
///
/// Callers that lose the race spin until the winner finishes, so every
/// caller returns after the effects of `func` are visible.
pub fn call_once<F: FnOnce()>(flag: &OnceFlag, func: F) {
    loop {
        match flag
            .state
            .compare_exchange(UNSTARTED, RUNNING, Ordering::Acquire, Ordering::Acquire)
        {
            Ok(_) => {
                let reset = ResetOnUnwind(&flag.state);
                func();
                std::mem::forget(reset);
                flag.state.store(DONE, Ordering::Release);
                return;
            }
            Err(DONE) => return,
            Err(_) => {
                spin_while(|| flag.state.load(Ordering::Acquire) == RUNNING);
                if flag.is_completed() {
                    return;
                }
            }
        }
    }
}
