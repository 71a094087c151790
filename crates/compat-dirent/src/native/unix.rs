use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::ptr::NonNull;

use super::{FindData, SearchPattern};
use super::{FILE_ATTRIBUTE_DEVICE, FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL};
use super::FILE_ATTRIBUTE_REPARSE_POINT;

/// Open enumeration over a `libc::DIR`. Closed on drop.
#[derive(Debug)]
pub struct FindHandle {
    dir: NonNull<libc::DIR>,
    directory: PathBuf,
}

// SAFETY: the DIR pointer is owned exclusively by this handle and only
// touched through &mut self.
unsafe impl Send for FindHandle {}

impl FindHandle {
    /// Start an enumeration and return its first entry.
    pub fn first(pattern: &SearchPattern) -> io::Result<(Self, FindData)> {
        let directory = pattern.directory();
        let c_path = CString::new(directory.as_os_str().as_bytes())?;
        // SAFETY: c_path is a valid NUL-terminated string.
        let raw = unsafe { libc::opendir(c_path.as_ptr()) };
        let dir = NonNull::new(raw).ok_or_else(io::Error::last_os_error)?;
        let mut handle = Self { dir, directory };
        match handle.next()? {
            Some(data) => Ok((handle, data)),
            None => Err(io::Error::from_raw_os_error(libc::ENOENT)),
        }
    }

    /// Next entry, or `None` once the enumeration is exhausted.
    pub fn next(&mut self) -> io::Result<Option<FindData>> {
        compat_errno::put_sys_errno(0);
        // SAFETY: dir is a live stream opened by opendir.
        let ent = unsafe { libc::readdir(self.dir.as_ptr()) };
        if ent.is_null() {
            return match compat_errno::get_sys_errno() {
                0 => Ok(None),
                code => Err(io::Error::from_raw_os_error(code)),
            };
        }
        // SAFETY: readdir returned a valid entry that stays alive until the
        // next readdir/closedir on this stream; we copy the name out now.
        let (name, d_type) = unsafe {
            let name = CStr::from_ptr((*ent).d_name.as_ptr()).to_bytes();
            (OsStr::from_bytes(name).to_os_string(), (*ent).d_type)
        };
        let attributes = match d_type {
            libc::DT_UNKNOWN => self.stat_attributes(&name),
            other => attributes_from_d_type(other),
        };
        Ok(Some(FindData { name, attributes }))
    }

    // Filesystems without d_type support report DT_UNKNOWN
    fn stat_attributes(&self, name: &OsStr) -> u32 {
        match std::fs::symlink_metadata(self.directory.join(name)) {
            Ok(meta) => attributes_from_file_type(meta.file_type()),
            Err(_) => FILE_ATTRIBUTE_NORMAL,
        }
    }
}

impl Drop for FindHandle {
    fn drop(&mut self) {
        // SAFETY: dir was opened by opendir and is closed exactly once.
        unsafe {
            libc::closedir(self.dir.as_ptr());
        }
    }
}

fn attributes_from_d_type(d_type: u8) -> u32 {
    match d_type {
        libc::DT_DIR => FILE_ATTRIBUTE_DIRECTORY,
        libc::DT_LNK => FILE_ATTRIBUTE_REPARSE_POINT,
        libc::DT_CHR | libc::DT_BLK => FILE_ATTRIBUTE_DEVICE,
        _ => FILE_ATTRIBUTE_NORMAL,
    }
}

fn attributes_from_file_type(ft: std::fs::FileType) -> u32 {
    use std::os::unix::fs::FileTypeExt;

    if ft.is_symlink() {
        FILE_ATTRIBUTE_REPARSE_POINT
    } else if ft.is_dir() {
        FILE_ATTRIBUTE_DIRECTORY
    } else if ft.is_char_device() || ft.is_block_device() {
        FILE_ATTRIBUTE_DEVICE
    } else {
        FILE_ATTRIBUTE_NORMAL
    }
}
