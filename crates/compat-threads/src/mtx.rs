use std::ops::BitOr;

use compat_config::log_threads_debug;

use crate::error::{Result, Status, ThrdError};
use crate::native::CriticalSection;
use crate::spin::spin_until_deadline;
use crate::time::Timespec;

/// Mutex type flags. `TIMED` and `RECURSIVE` may be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MtxType(i32);

impl MtxType {
    pub const PLAIN: MtxType = MtxType(0);
    pub const RECURSIVE: MtxType = MtxType(1);
    pub const TIMED: MtxType = MtxType(2);

    pub const fn from_bits(bits: i32) -> Self {
        MtxType(bits)
    }

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn contains(self, other: MtxType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MtxType {
    type Output = MtxType;

    fn bitor(self, rhs: MtxType) -> MtxType {
        MtxType(self.0 | rhs.0)
    }
}

/// C11 mutex on top of a critical section.
///
/// Every mutex is recursive whatever type it was created with: relocking
/// from the owning thread succeeds instead of deadlocking.
#[derive(Debug)]
pub struct Mtx {
    section: Box<CriticalSection>,
    kind: MtxType,
}

impl Mtx {
    pub fn init(kind: MtxType) -> Result<Self> {
        if !kind.contains(MtxType::RECURSIVE) {
            log_threads_debug!("Non-recursive mutex requested, created recursive", kind = kind.bits());
        }
        Ok(Self {
            section: Box::new(CriticalSection::new()),
            kind,
        })
    }

    /// Type the mutex was created with.
    pub fn kind(&self) -> MtxType {
        self.kind
    }

    pub fn lock(&self) -> Result<()> {
        self.section.enter();
        Ok(())
    }

    /// `Busy` when another thread holds the mutex.
    pub fn trylock(&self) -> Result<()> {
        if self.section.try_enter() {
            Ok(())
        } else {
            Err(ThrdError::Busy)
        }
    }

    /// Lock, giving up once the absolute time `deadline` has passed.
    ///
    /// Polls `trylock` with a yield between attempts, so a contended wait
    /// keeps the calling thread busy.
    pub fn timedlock(&self, deadline: &Timespec) -> Result<()> {
        if !deadline.is_valid() {
            return Err(ThrdError::Error.record());
        }
        if spin_until_deadline(deadline, || self.section.try_enter()) {
            Ok(())
        } else {
            Err(ThrdError::TimedOut)
        }
    }

    /// Release one level of ownership. `Error` if the calling thread does
    /// not hold the mutex.
    pub fn unlock(&self) -> Result<()> {
        if self.section.leave() {
            Ok(())
        } else {
            Err(ThrdError::Error.record())
        }
    }

    pub fn destroy(self) {}

    pub(crate) fn section(&self) -> &CriticalSection {
        &self.section
    }
}

pub fn mtx_init(mtx: &mut Option<Mtx>, kind: i32) -> i32 {
    match Mtx::init(MtxType::from_bits(kind)) {
        Ok(created) => {
            *mtx = Some(created);
            Status::Success.code()
        }
        Err(err) => err.status().code(),
    }
}

pub fn mtx_destroy(mtx: Mtx) {
    mtx.destroy();
}

pub fn mtx_lock(mtx: &Mtx) -> i32 {
    Status::from(mtx.lock()).code()
}

pub fn mtx_trylock(mtx: &Mtx) -> i32 {
    Status::from(mtx.trylock()).code()
}

pub fn mtx_timedlock(mtx: &Mtx, deadline: &Timespec) -> i32 {
    Status::from(mtx.timedlock(deadline)).code()
}

pub fn mtx_unlock(mtx: &Mtx) -> i32 {
    Status::from(mtx.unlock()).code()
}
