//! Native enumeration layer.
//!
//! [`FindHandle`] is the one-shot, forward-only "find first / find next"
//! primitive the directory streams are built on. Each entry comes back as a
//! [`FindData`]: the raw name plus a set of `FILE_ATTRIBUTE_*` bits.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{self, Path, PathBuf};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::FindHandle;

#[cfg(not(unix))]
mod portable;
#[cfg(not(unix))]
pub use portable::FindHandle;

pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
pub const FILE_ATTRIBUTE_DEVICE: u32 = 0x40;
pub const FILE_ATTRIBUTE_NORMAL: u32 = 0x80;
pub const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;

/// One entry as reported by the native enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindData {
    pub name: OsString,
    pub attributes: u32,
}

/// Absolute directory path followed by a match-everything wildcard,
/// e.g. `/home/user/src/*`.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    pattern: OsString,
    dir_len: usize,
}

impl SearchPattern {
    /// Resolve `dirname` against the current directory and append the
    /// wildcard. A separator is inserted unless the path already ends in
    /// `\`, `/` or `:`.
    pub fn new(dirname: &Path) -> io::Result<Self> {
        if dirname.as_os_str().is_empty() {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        let full = path::absolute(dirname)?;
        let mut pattern = full.into_os_string();
        if !ends_with_separator(&pattern) {
            pattern.push(path::MAIN_SEPARATOR_STR);
        }
        let dir_len = pattern.len();
        pattern.push("*");
        Ok(Self { pattern, dir_len })
    }

    pub fn as_os_str(&self) -> &OsStr {
        &self.pattern
    }

    /// Directory part of the pattern, trailing separator included.
    pub fn directory(&self) -> PathBuf {
        let lossless = self.pattern.as_encoded_bytes();
        // SAFETY: the split point is right after an ASCII separator we
        // inspected or pushed ourselves.
        let dir = unsafe { OsStr::from_encoded_bytes_unchecked(&lossless[..self.dir_len]) };
        PathBuf::from(dir)
    }
}

fn ends_with_separator(path: &OsStr) -> bool {
    matches!(path.as_encoded_bytes().last(), Some(b'\\' | b'/' | b':'))
}

/// Whether an open failure means the caller may not list the directory.
pub fn is_access_denied(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    #[cfg(windows)]
    {
        const ERROR_ACCESS_DENIED: i32 = 5;
        err.raw_os_error() == Some(ERROR_ACCESS_DENIED)
    }
    #[cfg(not(windows))]
    {
        err.raw_os_error() == Some(libc::EACCES)
    }
}

/// Whether an open failure means the path names something other than a
/// directory.
pub fn is_not_a_directory(err: &io::Error) -> bool {
    #[cfg(windows)]
    {
        const ERROR_DIRECTORY: i32 = 267;
        err.raw_os_error() == Some(ERROR_DIRECTORY)
    }
    #[cfg(not(windows))]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }
}
