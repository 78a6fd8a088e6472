//! Injectable time source for polling and waits.
//!
//! Everything that sleeps goes through a [`Clock`]. Production code uses
//! [`SystemClock`]; tests use [`FakeClock`], whose `sleep` advances virtual
//! time instantly and records each requested delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time and blocking sleeps
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block the caller for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
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

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fake clock for deterministic testing
#[derive(Debug, Default)]
pub struct FakeClock {
    /// Virtual time in milliseconds since origin
    current_ms: AtomicU64,
    /// Every sleep requested, in order
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable fake clock
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.current_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Sleeps requested so far
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of sleeps requested so far
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        self.sleeps.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Sum of all requested sleeps
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
    }
}
