use std::process;
use std::sync::{Mutex, MutexGuard};

use compat_config::{log_threads_debug, log_threads_error};

use crate::error::{Result, Status, ThrdError};
use crate::mtx::Mtx;
use crate::native::{wait_any, Event, Semaphore, Timeout, WaitDomain, WaitStatus, Waitable};
use crate::time::{timepoint_to_millisecond_timespan, Timespec};

const SIGNAL_MAX: u32 = 0x7fff_ffff;

/// C11 condition variable built from a counting semaphore (one wake per
/// `signal`) and a manual-reset event (wakes everyone on `broadcast`).
///
/// `waiters` counts the threads currently blocked and is only touched
/// under its own lock. Dropping a condition variable that still has
/// waiters aborts the process.
#[derive(Debug)]
pub struct Cnd {
    waiters: Mutex<usize>,
    signal: Semaphore,
    broadcast: Event,
}

impl Cnd {
    pub fn init() -> Result<Self> {
        let domain = WaitDomain::new();
        let signal = Semaphore::in_domain(&domain, 0, SIGNAL_MAX).ok_or(ThrdError::Error)?;
        Ok(Self {
            waiters: Mutex::new(0),
            signal,
            broadcast: Event::in_domain(&domain, true, false),
        })
    }

    fn waiters(&self) -> MutexGuard<'_, usize> {
        self.waiters.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Wake one waiter, if there is one.
    pub fn signal(&self) -> Result<()> {
        let waiters = self.waiters();
        if *waiters > 0 {
            // A full semaphore already wakes every waiter
            let _ = self.signal.release(1);
        }
        Ok(())
    }

    /// Wake every thread waiting at the time of the call.
    pub fn broadcast(&self) -> Result<()> {
        let waiters = self.waiters();
        if *waiters > 0 {
            self.broadcast.set();
        }
        Ok(())
    }

    /// Release `mtx`, wait to be signaled, then take `mtx` back.
    pub fn wait(&self, mtx: &Mtx) -> Result<()> {
        self.wait_for(mtx, Timeout::Infinite, false)
    }

    /// Like [`wait`](Cnd::wait) but gives up at the absolute time
    /// `deadline`. `mtx` is held again on every return path.
    pub fn timedwait(&self, mtx: &Mtx, deadline: &Timespec) -> Result<()> {
        if !deadline.is_valid() {
            return Err(ThrdError::Error.record());
        }
        let (ms, clamped) = timepoint_to_millisecond_timespan(&Timespec::now(), deadline);
        self.wait_for(mtx, Timeout::Millis(ms), clamped)
    }

    fn wait_for(&self, mtx: &Mtx, timeout: Timeout, clamped: bool) -> Result<()> {
        {
            let mut waiters = self.waiters();
            mtx.unlock()?;
            *waiters += 1;
        }

        let status = wait_any(
            &[&self.signal as &dyn Waitable, &self.broadcast as &dyn Waitable],
            timeout,
        );

        {
            let mut waiters = self.waiters();
            *waiters -= 1;
            if *waiters == 0 {
                // Last one out: drop wake-ups nobody consumed
                while self.signal.wait(Timeout::Millis(0)) != WaitStatus::TimedOut {}
                self.broadcast.reset();
            }
        }

        mtx.section().enter();

        match status {
            WaitStatus::Object(_) => Ok(()),
            WaitStatus::TimedOut if clamped => {
                log_threads_debug!("Clamped wait expired, reporting a spurious wake-up");
                Ok(())
            }
            WaitStatus::TimedOut => Err(ThrdError::TimedOut),
        }
    }

    pub fn destroy(self) {}
}

impl Drop for Cnd {
    fn drop(&mut self) {
        let waiters = *self.waiters();
        if waiters != 0 {
            log_threads_error!("Condition variable destroyed with waiters", waiters = waiters);
            process::abort();
        }
    }
}

pub fn cnd_init(cond: &mut Option<Cnd>) -> i32 {
    match Cnd::init() {
        Ok(created) => {
            *cond = Some(created);
            Status::Success.code()
        }
        Err(err) => err.status().code(),
    }
}

pub fn cnd_destroy(cond: Cnd) {
    cond.destroy();
}

pub fn cnd_signal(cond: &Cnd) -> i32 {
    Status::from(cond.signal()).code()
}

pub fn cnd_broadcast(cond: &Cnd) -> i32 {
    Status::from(cond.broadcast()).code()
}

pub fn cnd_wait(cond: &Cnd, mtx: &Mtx) -> i32 {
    Status::from(cond.wait(mtx)).code()
}

pub fn cnd_timedwait(cond: &Cnd, mtx: &Mtx, deadline: &Timespec) -> i32 {
    Status::from(cond.timedwait(mtx, deadline)).code()
}
