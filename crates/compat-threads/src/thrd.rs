use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use compat_config::log_threads_debug;

use crate::error::{Result, Status, ThrdError};
use crate::native::WaitableTimer;
use crate::time::{timespec_to_file_time, Timespec, PERIOD_TICKS};

/// Payload carried by the unwind started in [`thrd_exit`].
struct ThreadExit(i32);

/// Identity of a running thread, comparable with [`thrd_equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThrdId(ThreadId);

/// A joinable thread. `join` and `detach` consume the handle.
#[derive(Debug)]
pub struct Thrd {
    handle: JoinHandle<i32>,
}

impl Thrd {
    /// Start `func` on a new thread. Its return value, or the code passed
    /// to [`thrd_exit`], becomes the exit code reported by `join`.
    pub fn create<F>(func: F) -> Result<Self>
    where
        F: FnOnce() -> i32 + Send + 'static,
    {
        let handle = thread::Builder::new()
            .spawn(move || run_thread(func))
            .map_err(|err| spawn_error(&err).record())?;
        Ok(Self { handle })
    }

    pub fn id(&self) -> ThrdId {
        ThrdId(self.handle.thread().id())
    }

    /// Wait for the thread to finish and return its exit code. A thread
    /// that panicked reports `Error`.
    pub fn join(self) -> Result<i32> {
        self.handle.join().map_err(|_| ThrdError::Error.record())
    }

    /// Let the thread run to completion on its own.
    pub fn detach(self) -> Result<()> {
        drop(self.handle);
        Ok(())
    }
}

fn run_thread<F: FnOnce() -> i32>(func: F) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(func)) {
        Ok(code) => code,
        Err(payload) => match payload.downcast::<ThreadExit>() {
            Ok(exit) => exit.0,
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

fn spawn_error(err: &io::Error) -> ThrdError {
    if err.kind() == io::ErrorKind::OutOfMemory || err.raw_os_error() == Some(compat_errno::ENOMEM)
    {
        ThrdError::NoMem
    } else {
        ThrdError::Error
    }
}

/// End the calling thread with exit code `code`.
///
/// Unwinds to the entry point installed by [`Thrd::create`], running the
/// destructors of live locals on the way. Called on a thread not started
/// through `Thrd::create`, the unwind is an ordinary panic.
pub fn thrd_exit(code: i32) -> ! {
    panic::resume_unwind(Box::new(ThreadExit(code)))
}

pub fn thrd_current() -> ThrdId {
    ThrdId(thread::current().id())
}

pub fn thrd_equal(a: ThrdId, b: ThrdId) -> bool {
    a == b
}

pub fn thrd_yield() {
    thread::yield_now();
}

/// Sleep for the relative span `duration`.
///
/// Spans longer than one native timer period are slept in consecutive
/// chunks. Rounding is upward, so the sleep is never shorter than asked.
pub fn sleep(duration: &Timespec) -> Result<()> {
    let Some(mut span) = timespec_to_file_time(duration) else {
        return Err(ThrdError::Error.record());
    };
    let timer = WaitableTimer::new();
    loop {
        timer.set_relative(span.ticks);
        timer.wait();
        if span.periods == 0 {
            return Ok(());
        }
        log_threads_debug!("Sleep continues", periods_left = span.periods);
        span.periods -= 1;
        span.ticks = PERIOD_TICKS;
    }
}

/// C11 `thrd_create`.
pub fn thrd_create<F>(thr: &mut Option<Thrd>, func: F) -> i32
where
    F: FnOnce() -> i32 + Send + 'static,
{
    match Thrd::create(func) {
        Ok(handle) => {
            *thr = Some(handle);
            Status::Success.code()
        }
        Err(err) => err.status().code(),
    }
}

/// C11 `thrd_join`. The exit code is stored in `res` when given.
pub fn thrd_join(thr: Thrd, res: Option<&mut i32>) -> i32 {
    match thr.join() {
        Ok(code) => {
            if let Some(res) = res {
                *res = code;
            }
            Status::Success.code()
        }
        Err(err) => err.status().code(),
    }
}

pub fn thrd_detach(thr: Thrd) -> i32 {
    Status::from(thr.detach()).code()
}

/// C11 `thrd_sleep`: 0 once the span has elapsed, -2 for an invalid span.
/// The sleep is not interruptible, so `remaining` is zeroed on success.
pub fn thrd_sleep(duration: &Timespec, remaining: Option<&mut Timespec>) -> i32 {
    match sleep(duration) {
        Ok(()) => {
            if let Some(remaining) = remaining {
                *remaining = Timespec::default();
            }
            0
        }
        Err(_) => -2,
    }
}
