//! # compat-threads
//!
//! C11 `<threads.h>` emulated on Win32-shaped primitives (recursive critical
//! sections, counting semaphores, manual-reset events, waitable timers and
//! TLS indices), together with the `<time.h>` helpers the timed calls need
//! and unnamed POSIX semaphores.
//!
//! Two surfaces are offered. The Rust one uses owned handles and
//! `Result<_, ThrdError>`:
//!
//! ```ignore
//! use compat_threads::{Cnd, Mtx, MtxType, Thrd};
//!
//! let mtx = Mtx::init(MtxType::PLAIN)?;
//! let worker = Thrd::create(|| 42)?;
//! assert_eq!(worker.join()?, 42);
//! ```
//!
//! The C-shaped one (`mtx_lock`, `cnd_wait`, `thrd_sleep`, ...) returns the
//! numeric `thrd_*` status codes.

mod cnd;
mod error;
mod mtx;
pub mod native;
mod once;
pub mod sem;
pub mod spin;
mod thrd;
pub mod time;
mod tss;

pub use cnd::{cnd_broadcast, cnd_destroy, cnd_init, cnd_signal, cnd_timedwait, cnd_wait, Cnd};
pub use error::{Result, Status, ThrdError};
pub use error::{THRD_BUSY, THRD_ERROR, THRD_NOMEM, THRD_SUCCESS, THRD_TIMEDOUT};
pub use mtx::{mtx_destroy, mtx_init, mtx_lock, mtx_timedlock, mtx_trylock, mtx_unlock, Mtx, MtxType};
pub use once::{call_once, OnceFlag, ONCE_FLAG_INIT};
pub use sem::{Sem, SemError, SEM_VALUE_MAX};
pub use thrd::{thrd_create, thrd_current, thrd_detach, thrd_equal, thrd_exit, thrd_join};
pub use thrd::{thrd_sleep, thrd_yield, Thrd, ThrdId};
pub use time::{timespec_get, timespec_getres, Timespec, TIME_UTC};
pub use tss::{tss_create, tss_delete, tss_get, tss_set, Tss, TssDtor, TSS_DTOR_ITERATIONS};
