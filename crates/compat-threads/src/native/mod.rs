//! Win32-shaped synchronization primitives.
//!
//! The emulator in the parent modules is written against these, the way the
//! C11 layer is written against critical sections, kernel semaphores,
//! events, waitable timers and TLS indices on Windows hosts.

#[cfg(unix)]
pub mod critical_section;
#[cfg(not(unix))]
#[path = "critical_section_portable.rs"]
pub mod critical_section;
pub mod timer;
pub mod tls;
pub mod waitable;

pub use critical_section::CriticalSection;
pub use timer::WaitableTimer;
pub use tls::{set_thread_detach_hook, tls_alloc, tls_free, tls_get, tls_set, TlsIndex};
pub use waitable::{wait_any, Event, Semaphore, Timeout, TooManyPosts, WaitDomain, WaitStatus, Waitable, INFINITE};
