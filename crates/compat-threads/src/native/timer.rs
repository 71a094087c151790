use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// One-shot timer with a relative due time in 100 ns ticks, like a
/// manual-reset waitable timer.
#[derive(Debug, Default)]
pub struct WaitableTimer {
    due: Mutex<Option<(Instant, Duration)>>,
}

impl WaitableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `ticks` hundred-nanosecond units from now.
    pub fn set_relative(&self, ticks: u64) {
        let span = Duration::from_secs(ticks / 10_000_000)
            + Duration::from_nanos((ticks % 10_000_000) * 100);
        let mut due = self.due.lock().unwrap_or_else(|p| p.into_inner());
        *due = Some((Instant::now(), span));
    }

    /// Block until the armed due time has passed. Returns `false` if the
    /// timer was never armed.
    pub fn wait(&self) -> bool {
        let armed = *self.due.lock().unwrap_or_else(|p| p.into_inner());
        let Some((start, span)) = armed else {
            return false;
        };
        loop {
            let elapsed = start.elapsed();
            if elapsed >= span {
                return true;
            }
            thread::sleep(span - elapsed);
        }
    }
}
