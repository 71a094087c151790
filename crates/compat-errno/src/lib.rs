//! # compat-errno
//!
//! Two last-error channels, kept apart on purpose:
//!
//! - the **standard** channel holds POSIX `errno` codes reported by the
//!   emulated interfaces (`EACCES`, `ENOTDIR`, `ETIMEDOUT`, ...);
//! - the **system** channel is the host's own last-error slot (`errno` on
//!   unix hosts), written alongside the standard one on emulation paths.
//!
//! Both are per-thread, like C `errno`.

use std::cell::Cell;
use std::ffi::CStr;
use std::sync::Mutex;

use once_cell::sync::Lazy;

pub use libc::{
    EACCES, EAGAIN, EBADF, EBUSY, EEXIST, EINTR, EINVAL, ENOENT, ENOMEM, ENOSPC, ENOSYS, ENOTDIR,
    EOVERFLOW, ERANGE, ETIMEDOUT,
};

thread_local! {
    static STD_ERRNO: Cell<i32> = const { Cell::new(0) };
}

/// Store a POSIX error code on the standard channel.
pub fn put_std_errno(errnum: i32) {
    STD_ERRNO.with(|e| e.set(errnum));
}

/// Last POSIX error code stored on the standard channel.
pub fn get_std_errno() -> i32 {
    STD_ERRNO.with(|e| e.get())
}

/// Store a code on the host's last-error slot.
pub fn put_sys_errno(errnum: i32) {
    sys::set(errnum);
}

/// Host's last-error slot.
pub fn get_sys_errno() -> i32 {
    sys::get()
}

/// Record the same code on both channels.
pub fn put_errno(errnum: i32) {
    put_std_errno(errnum);
    put_sys_errno(errnum);
}

// strerror shares a static buffer on several libcs
static STRERROR_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Human readable text for a POSIX error code.
pub fn str_std_error(errnum: i32) -> String {
    let _guard = STRERROR_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    // SAFETY: strerror returns a NUL-terminated string valid until the next
    // strerror call, which the lock excludes while we copy it out.
    unsafe {
        let ptr = libc::strerror(errnum);
        if ptr.is_null() {
            return format!("Unknown error {}", errnum);
        }
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Human readable text for a host error code.
pub fn str_sys_error(errnum: i32) -> String {
    std::io::Error::from_raw_os_error(errnum).to_string()
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod sys {
    pub fn set(errnum: i32) {
        unsafe { *libc::__errno_location() = errnum };
    }

    pub fn get() -> i32 {
        unsafe { *libc::__errno_location() }
    }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
mod sys {
    pub fn set(errnum: i32) {
        unsafe { *libc::__error() = errnum };
    }

    pub fn get() -> i32 {
        unsafe { *libc::__error() }
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
)))]
mod sys {
    use std::cell::Cell;

    thread_local! {
        static SYS_ERRNO: Cell<i32> = const { Cell::new(0) };
    }

    pub fn set(errnum: i32) {
        SYS_ERRNO.with(|e| e.set(errnum));
    }

    pub fn get() -> i32 {
        SYS_ERRNO.with(|e| e.get())
    }
}
