//! `timespec` helpers and conversions to the native time units: 100 ns
//! FILETIME ticks for sleeps and whole milliseconds for waits.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::native::INFINITE;

/// Base accepted by [`timespec_get`] and [`timespec_getres`].
pub const TIME_UTC: i32 = 1;

pub const NSEC_PER_SEC: i64 = 1_000_000_000;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
pub const FILE_TIME_EPOCH_OFFSET: u64 = 11_644_473_600;

/// FILETIME ticks per second.
pub const TICKS_PER_SEC: u64 = 10_000_000;

/// Seconds covered by one maximum-length relative wait.
const PERIOD_SECS: u64 = 922_337_203_685;

/// Ticks in one maximum-length relative wait.
pub const PERIOD_TICKS: u64 = PERIOD_SECS * TICKS_PER_SEC;

/// C `struct timespec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespec {
    pub tv_sec: i64,
    pub tv_nsec: i64,
}

impl Timespec {
    pub const fn new(tv_sec: i64, tv_nsec: i64) -> Self {
        Self { tv_sec, tv_nsec }
    }

    /// Current calendar time.
    pub fn now() -> Self {
        timespec_from_file_time(file_time_now())
    }

    /// Absolute time `after` from now, for deadline-taking calls.
    pub fn after(after: Duration) -> Self {
        let now = Self::now();
        let nsec = now.tv_nsec + after.subsec_nanos() as i64;
        Self {
            tv_sec: now.tv_sec + after.as_secs() as i64 + nsec / NSEC_PER_SEC,
            tv_nsec: nsec % NSEC_PER_SEC,
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self {
            tv_sec: duration.as_secs() as i64,
            tv_nsec: duration.subsec_nanos() as i64,
        }
    }

    /// Non-negative seconds and nanoseconds within `[0, 999_999_999]`.
    pub fn is_valid(&self) -> bool {
        self.tv_sec >= 0 && (0..NSEC_PER_SEC).contains(&self.tv_nsec)
    }
}

/// Current time as FILETIME ticks since 1601-01-01.
pub fn file_time_now() -> u64 {
    let offset = Duration::from_secs(FILE_TIME_EPOCH_OFFSET);
    let since_1601 = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(after) => offset + after,
        Err(before) => offset.saturating_sub(before.duration()),
    };
    since_1601.as_secs() * TICKS_PER_SEC + since_1601.subsec_nanos() as u64 / 100
}

pub fn timespec_from_file_time(file_time: u64) -> Timespec {
    Timespec {
        tv_sec: (file_time / TICKS_PER_SEC) as i64 - FILE_TIME_EPOCH_OFFSET as i64,
        tv_nsec: (file_time % TICKS_PER_SEC) as i64 * 100,
    }
}

/// C11 `timespec_get`: fills `ts` and returns `base`, or 0 for an unknown
/// base.
pub fn timespec_get(ts: &mut Timespec, base: i32) -> i32 {
    if base != TIME_UTC {
        return 0;
    }
    *ts = Timespec::now();
    base
}

/// C23 `timespec_getres`: resolution of the clock behind `base`.
pub fn timespec_getres(ts: Option<&mut Timespec>, base: i32) -> i32 {
    if base != TIME_UTC {
        return 0;
    }
    let Some(ticks_per_sec) = clock_ticks_per_sec() else {
        return 0;
    };
    if let Some(ts) = ts {
        *ts = Timespec::new(0, NSEC_PER_SEC / ticks_per_sec);
    }
    base
}

#[cfg(unix)]
fn clock_ticks_per_sec() -> Option<i64> {
    // SAFETY: sysconf has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    (ticks > 0).then_some(ticks as i64)
}

#[cfg(not(unix))]
fn clock_ticks_per_sec() -> Option<i64> {
    Some(TICKS_PER_SEC as i64)
}

/// A relative span in FILETIME ticks, split into whole maximum-length
/// periods plus a remainder so that spans beyond the native range can be
/// waited out one chunk at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimeSpan {
    /// Extra waits of [`PERIOD_TICKS`] each, taken after `ticks`.
    pub periods: u64,
    pub ticks: u64,
}

/// Convert a relative `timespec` into FILETIME ticks.
///
/// Sub-tick nanoseconds round up, so a sleep never ends early. Returns
/// `None` for an invalid `timespec`.
pub fn timespec_to_file_time(ts: &Timespec) -> Option<FileTimeSpan> {
    if !ts.is_valid() {
        return None;
    }
    let sec = ts.tv_sec as u64;
    let nsec = ts.tv_nsec as u64;

    let mut periods = sec / PERIOD_SECS;
    let sec_ticks = sec % PERIOD_SECS * TICKS_PER_SEC;
    let nsec_ticks = nsec / 100 + u64::from(nsec % 100 != 0);
    let mut ticks = sec_ticks + nsec_ticks;

    // A whole number of periods: wait the last one out as the remainder
    if periods > 0 && ticks == 0 {
        periods -= 1;
        ticks = PERIOD_TICKS;
    }
    Some(FileTimeSpan { periods, ticks })
}

/// Convert a relative `timespec` to whole milliseconds, rounding up.
/// `None` if the result would reach `INFINITE`.
pub fn timespec_to_milliseconds(ts: &Timespec) -> Option<u32> {
    let limit = (INFINITE - 1) as u64;
    let sec = u64::try_from(ts.tv_sec).ok()?;
    if sec > limit / 1000 {
        return None;
    }
    let sec_ms = sec * 1000;
    let nsec = ts.tv_nsec as u64;
    let nsec_ms = nsec / 1_000_000 + u64::from(nsec % 1_000_000 != 0);
    if nsec_ms > limit - sec_ms {
        return None;
    }
    Some((sec_ms + nsec_ms) as u32)
}

/// Milliseconds from `current` until `end`, 0 if `end` has passed.
///
/// A span too long for a native wait is clamped to `INFINITE - 1` and the
/// second value is `true`; the caller should then treat a timeout as a
/// spurious wake-up.
pub fn timepoint_to_millisecond_timespan(current: &Timespec, end: &Timespec) -> (u32, bool) {
    if current >= end {
        return (0, false);
    }
    let mut span = Timespec::new(end.tv_sec - current.tv_sec, end.tv_nsec - current.tv_nsec);
    if span.tv_nsec < 0 {
        span.tv_sec -= 1;
        span.tv_nsec += NSEC_PER_SEC;
    }
    match timespec_to_milliseconds(&span) {
        Some(ms) => (ms, false),
        None => (INFINITE - 1, true),
    }
}
