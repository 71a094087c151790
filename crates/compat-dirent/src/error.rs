use std::io;

use thiserror::Error;

/// Errors reported by directory stream operations.
///
/// Every variant corresponds to exactly one POSIX error code, which is also
/// stored on the standard last-error channel when the error is raised.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirentError {
    #[error("no such file or directory")]
    NotFound,

    #[error("permission denied")]
    AccessDenied,

    #[error("not a directory")]
    NotADirectory,

    #[error("bad directory stream")]
    BadHandle,

    #[error("out of memory")]
    OutOfMemory,
}

pub type Result<T> = std::result::Result<T, DirentError>;

impl DirentError {
    /// POSIX code for this error.
    pub fn errno(self) -> i32 {
        match self {
            DirentError::NotFound => compat_errno::ENOENT,
            DirentError::AccessDenied => compat_errno::EACCES,
            DirentError::NotADirectory => compat_errno::ENOTDIR,
            DirentError::BadHandle => compat_errno::EBADF,
            DirentError::OutOfMemory => compat_errno::ENOMEM,
        }
    }

    /// Store the code on the last-error channels and hand the error back.
    pub(crate) fn record(self) -> Self {
        compat_errno::put_errno(self.errno());
        self
    }

    /// Nearest POSIX error for a failure to open an enumeration.
    ///
    /// Access-denied and not-a-directory are kept; anything else reads as
    /// "not found".
    pub(crate) fn from_open_failure(err: &io::Error) -> Self {
        if crate::native::is_access_denied(err) {
            DirentError::AccessDenied
        } else if crate::native::is_not_a_directory(err) {
            DirentError::NotADirectory
        } else {
            DirentError::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(DirentError::NotFound.errno(), compat_errno::ENOENT);
        assert_eq!(DirentError::AccessDenied.errno(), compat_errno::EACCES);
        assert_eq!(DirentError::NotADirectory.errno(), compat_errno::ENOTDIR);
        assert_eq!(DirentError::BadHandle.errno(), compat_errno::EBADF);
        assert_eq!(DirentError::OutOfMemory.errno(), compat_errno::ENOMEM);
    }

    #[test]
    fn test_record_sets_errno() {
        compat_errno::put_std_errno(0);
        let err = DirentError::NotADirectory.record();
        assert_eq!(err, DirentError::NotADirectory);
        assert_eq!(compat_errno::get_std_errno(), compat_errno::ENOTDIR);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_failure_translation() {
        let denied = io::Error::from_raw_os_error(libc::EACCES);
        let not_dir = io::Error::from_raw_os_error(libc::ENOTDIR);
        let other = io::Error::from_raw_os_error(libc::ELOOP);
        assert_eq!(DirentError::from_open_failure(&denied), DirentError::AccessDenied);
        assert_eq!(DirentError::from_open_failure(&not_dir), DirentError::NotADirectory);
        assert_eq!(DirentError::from_open_failure(&other), DirentError::NotFound);
    }
}
