use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source for the monitor.
///
/// `now` is monotonic and measured from the clock's own origin; `unix_time` is
/// wall-clock seconds, used only to compare against server-reported timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
    fn unix_time(&self) -> f64;

    fn unix_millis(&self) -> i64 {
        (self.unix_time() * 1000.0) as i64
    }
}

/// Real clock backed by `Instant` and `chrono::Utc`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn unix_time(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    fn unix_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug)]
struct ManualTime {
    monotonic: Duration,
    unix: f64,
}

/// Hand-driven clock for deterministic dispatch in tests and replays.
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

impl ManualClock {
    pub fn new(unix_start: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                monotonic: Duration::ZERO,
                unix: unix_start,
            })),
        }
    }

    /// Move both the monotonic and the wall clock forward
    pub fn advance(&self, by: Duration) {
        let mut time = self.inner.lock();
        time.monotonic += by;
        time.unix += by.as_secs_f64();
    }

    /// Jump the monotonic clock to an absolute offset; never moves backwards
    pub fn set(&self, at: Duration) {
        let mut time = self.inner.lock();
        if at > time.monotonic {
            let delta = at - time.monotonic;
            time.monotonic = at;
            time.unix += delta.as_secs_f64();
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner.lock().monotonic
    }

    fn unix_time(&self) -> f64 {
        self.inner.lock().unix
    }
}
