use thiserror::Error;

pub const THRD_SUCCESS: i32 = 0;
pub const THRD_TIMEDOUT: i32 = 1;
pub const THRD_BUSY: i32 = 2;
pub const THRD_ERROR: i32 = 3;
pub const THRD_NOMEM: i32 = 4;

/// C11 thread status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = THRD_SUCCESS,
    TimedOut = THRD_TIMEDOUT,
    Busy = THRD_BUSY,
    Error = THRD_ERROR,
    NoMem = THRD_NOMEM,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Failure of a thread, mutex, condition variable or TSS operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrdError {
    #[error("timed out")]
    TimedOut,

    #[error("resource busy")]
    Busy,

    #[error("operation failed")]
    Error,

    #[error("out of memory")]
    NoMem,
}

pub type Result<T> = std::result::Result<T, ThrdError>;

impl ThrdError {
    pub fn status(self) -> Status {
        match self {
            ThrdError::TimedOut => Status::TimedOut,
            ThrdError::Busy => Status::Busy,
            ThrdError::Error => Status::Error,
            ThrdError::NoMem => Status::NoMem,
        }
    }

    /// POSIX code for this error.
    pub fn errno(self) -> i32 {
        match self {
            ThrdError::TimedOut => compat_errno::ETIMEDOUT,
            ThrdError::Busy => compat_errno::EBUSY,
            ThrdError::Error => compat_errno::EINVAL,
            ThrdError::NoMem => compat_errno::ENOMEM,
        }
    }

    pub(crate) fn record(self) -> Self {
        compat_errno::put_std_errno(self.errno());
        self
    }
}

impl<T> From<std::result::Result<T, ThrdError>> for Status {
    fn from(result: std::result::Result<T, ThrdError>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(err) => err.status(),
        }
    }
}
