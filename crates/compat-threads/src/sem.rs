//! Unnamed POSIX semaphores on top of the native counting semaphore.
//!
//! Only process-private semaphores exist: `pshared` is refused with
//! `ENOSYS`.

use compat_config::log_sem_debug;
use thiserror::Error;

use crate::native::{Semaphore, Timeout, WaitStatus};
use crate::time::{timepoint_to_millisecond_timespan, Timespec, NSEC_PER_SEC};

/// Largest count a semaphore can hold.
pub const SEM_VALUE_MAX: u32 = 0x7fff_ffff;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemError {
    #[error("invalid argument")]
    InvalidArgument,

    #[error("process-shared semaphores are not supported")]
    NotSupported,

    #[error("no semaphore could be created")]
    NoSpace,

    #[error("wait interrupted")]
    Interrupted,

    #[error("semaphore is zero")]
    WouldBlock,

    #[error("timed out")]
    TimedOut,

    #[error("semaphore value would exceed SEM_VALUE_MAX")]
    Overflow,
}

impl SemError {
    pub fn errno(self) -> i32 {
        match self {
            SemError::InvalidArgument => compat_errno::EINVAL,
            SemError::NotSupported => compat_errno::ENOSYS,
            SemError::NoSpace => compat_errno::ENOSPC,
            SemError::Interrupted => compat_errno::EINTR,
            SemError::WouldBlock => compat_errno::EAGAIN,
            SemError::TimedOut => compat_errno::ETIMEDOUT,
            SemError::Overflow => compat_errno::EOVERFLOW,
        }
    }

    fn record(self) -> Self {
        compat_errno::put_std_errno(self.errno());
        self
    }
}

pub type Result<T> = std::result::Result<T, SemError>;

#[derive(Debug)]
pub struct Sem {
    inner: Semaphore,
}

impl Sem {
    pub fn init(pshared: bool, value: u32) -> Result<Self> {
        if value > SEM_VALUE_MAX {
            return Err(SemError::InvalidArgument.record());
        }
        if pshared {
            log_sem_debug!("Process-shared semaphore refused");
            return Err(SemError::NotSupported.record());
        }
        let inner = Semaphore::new(value, SEM_VALUE_MAX).ok_or_else(|| SemError::NoSpace.record())?;
        Ok(Self { inner })
    }

    /// Block until the count is positive, then decrement it.
    pub fn wait(&self) -> Result<()> {
        match self.inner.wait(Timeout::Infinite) {
            WaitStatus::Object(_) => Ok(()),
            WaitStatus::TimedOut => Err(SemError::Interrupted.record()),
        }
    }

    /// Decrement without blocking. `WouldBlock` when the count is zero.
    pub fn trywait(&self) -> Result<()> {
        match self.inner.wait(Timeout::Millis(0)) {
            WaitStatus::Object(_) => Ok(()),
            WaitStatus::TimedOut => Err(SemError::WouldBlock.record()),
        }
    }

    /// Like [`wait`](Sem::wait), giving up at the absolute time `deadline`.
    /// A deadline already in the past still takes an available count.
    pub fn timedwait(&self, deadline: &Timespec) -> Result<()> {
        if !(0..NSEC_PER_SEC).contains(&deadline.tv_nsec) {
            return Err(SemError::InvalidArgument.record());
        }
        loop {
            let (ms, clamped) = timepoint_to_millisecond_timespan(&Timespec::now(), deadline);
            match self.inner.wait(Timeout::Millis(ms)) {
                WaitStatus::Object(_) => return Ok(()),
                WaitStatus::TimedOut if clamped => {
                    log_sem_debug!("Clamped wait expired, waiting again", ms = ms);
                }
                WaitStatus::TimedOut => return Err(SemError::TimedOut.record()),
            }
        }
    }

    pub fn post(&self) -> Result<()> {
        self.inner
            .release(1)
            .map(|_| ())
            .map_err(|_| SemError::Overflow.record())
    }

    /// Current count. Taken by briefly acquiring and releasing one unit, so
    /// a concurrent waiter may see the semaphore as zero meanwhile.
    pub fn getvalue(&self) -> Result<u32> {
        match self.inner.wait(Timeout::Millis(0)) {
            WaitStatus::Object(_) => match self.inner.release(1) {
                Ok(previous) => Ok(previous + 1),
                Err(_) => Err(SemError::InvalidArgument.record()),
            },
            WaitStatus::TimedOut => Ok(0),
        }
    }

    pub fn destroy(self) -> Result<()> {
        Ok(())
    }
}

fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// `sem_init`: 0 on success, -1 with `errno` set otherwise.
pub fn sem_init(sem: &mut Option<Sem>, pshared: i32, value: u32) -> i32 {
    status(Sem::init(pshared != 0, value).map(|created| *sem = Some(created)))
}

pub fn sem_wait(sem: &Sem) -> i32 {
    status(sem.wait())
}

pub fn sem_trywait(sem: &Sem) -> i32 {
    status(sem.trywait())
}

pub fn sem_timedwait(sem: &Sem, deadline: &Timespec) -> i32 {
    status(sem.timedwait(deadline))
}

pub fn sem_post(sem: &Sem) -> i32 {
    status(sem.post())
}

pub fn sem_getvalue(sem: &Sem, sval: &mut i32) -> i32 {
    status(sem.getvalue().map(|value| *sval = value as i32))
}

pub fn sem_destroy(sem: Sem) -> i32 {
    status(sem.destroy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_init_rejections() {
        assert_eq!(Sem::init(false, SEM_VALUE_MAX + 1).unwrap_err(), SemError::InvalidArgument);
        assert_eq!(compat_errno::get_std_errno(), compat_errno::EINVAL);
        assert_eq!(Sem::init(true, 0).unwrap_err(), SemError::NotSupported);
        assert_eq!(compat_errno::get_std_errno(), compat_errno::ENOSYS);
    }

    #[test]
    fn test_count_follows_posts_and_waits() {
        let sem = Sem::init(false, 2).unwrap();
        assert_eq!(sem.getvalue().unwrap(), 2);
        sem.wait().unwrap();
        sem.trywait().unwrap();
        assert_eq!(sem.getvalue().unwrap(), 0);
        assert_eq!(sem.trywait().unwrap_err(), SemError::WouldBlock);
        assert_eq!(compat_errno::get_std_errno(), compat_errno::EAGAIN);
        sem.post().unwrap();
        assert_eq!(sem.getvalue().unwrap(), 1);
    }

    #[test]
    fn test_post_overflow() {
        let sem = Sem::init(false, SEM_VALUE_MAX).unwrap();
        assert_eq!(sem.post().unwrap_err(), SemError::Overflow);
        assert_eq!(compat_errno::get_std_errno(), compat_errno::EOVERFLOW);
    }

    #[test]
    fn test_timedwait() {
        let sem = Sem::init(false, 0).unwrap();
        assert_eq!(
            sem.timedwait(&Timespec::new(0, NSEC_PER_SEC)).unwrap_err(),
            SemError::InvalidArgument
        );

        let start = Instant::now();
        let deadline = Timespec::after(Duration::from_millis(30));
        assert_eq!(sem.timedwait(&deadline).unwrap_err(), SemError::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert_eq!(compat_errno::get_std_errno(), compat_errno::ETIMEDOUT);

        sem.post().unwrap();
        sem.timedwait(&Timespec::new(0, 0)).unwrap();
    }

    #[test]
    fn test_wait_is_released_by_post() {
        let sem = Arc::new(Sem::init(false, 0).unwrap());
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.wait())
        };
        thread::sleep(Duration::from_millis(20));
        sem.post().unwrap();
        waiter.join().unwrap().unwrap();
        assert_eq!(sem.getvalue().unwrap(), 0);
    }

    #[test]
    fn test_c_shaped_surface() {
        let mut sem = None;
        assert_eq!(sem_init(&mut sem, 0, 1), 0);
        let sem = sem.unwrap();
        let mut value = -1;
        assert_eq!(sem_getvalue(&sem, &mut value), 0);
        assert_eq!(value, 1);
        assert_eq!(sem_trywait(&sem), 0);
        assert_eq!(sem_trywait(&sem), -1);
        assert_eq!(sem_post(&sem), 0);
        assert_eq!(sem_wait(&sem), 0);
        assert_eq!(sem_init(&mut None, 1, 0), -1);
        assert_eq!(sem_destroy(sem), 0);
    }
}
