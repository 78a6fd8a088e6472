//! Wait mechanisms for synchronization.
//!
//! Timeout-bounded polling for element presence and text, the same contract
//! as a WebDriver explicit wait: a missing element counts as "not yet" and
//! is polled again, any other driver error ends the wait immediately.

use crate::clock::Clock;
use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use std::time::Duration;

/// Default timeout for wait operations (60 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options timing out after `seconds`
    #[must_use]
    pub const fn from_seconds(seconds: u64) -> Self {
        Self {
            timeout_ms: seconds.saturating_mul(1000),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Polls a driver until a condition holds or the timeout passes
pub struct Waiter<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    clock: &'a dyn Clock,
    options: WaitOptions,
}

impl<'a, D: PageDriver + ?Sized> Waiter<'a, D> {
    /// Create a waiter over `driver`
    pub fn new(driver: &'a D, clock: &'a dyn Clock, options: WaitOptions) -> Self {
        Self {
            driver,
            clock,
            options,
        }
    }

    /// Poll `probe` until it yields a value
    ///
    /// `Ok(None)` and [`ProbeError::ElementNotFound`] mean "not yet".
    pub fn until<T, F>(&self, condition: &str, mut probe: F) -> ProbeResult<T>
    where
        F: FnMut(&D) -> ProbeResult<Option<T>>,
    {
        let start = self.clock.now();
        let timeout = self.options.timeout();
        loop {
            match probe(self.driver) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_not_found() => {
                    tracing::trace!("waiting for {condition}: {e}");
                }
                Err(e) => return Err(e),
            }
            if self.clock.now().saturating_sub(start) >= timeout {
                tracing::warn!("gave up waiting for {condition}");
                return Err(ProbeError::Timeout {
                    ms: self.options.timeout_ms,
                    condition: condition.to_string(),
                });
            }
            self.clock.sleep(self.options.poll_interval());
        }
    }

    /// Wait until `selector` is present in the document
    pub fn for_presence(&self, selector: &Selector) -> ProbeResult<()> {
        self.until(&format!("presence of {selector}"), |d| {
            d.text(selector).map(|_| Some(()))
        })
    }

    /// Wait until the rendered text of `selector` contains `text`
    pub fn for_text(&self, selector: &Selector, text: &str) -> ProbeResult<String> {
        self.until(&format!("'{text}' in {selector}"), |d| {
            d.text(selector)
                .map(|current| current.contains(text).then_some(current))
        })
    }

    /// Wait until the `value` of `selector` contains `text`
    pub fn for_value(&self, selector: &Selector, text: &str) -> ProbeResult<String> {
        self.until(&format!("'{text}' in value of {selector}"), |d| {
            d.value(selector)
                .map(|current| current.contains(text).then_some(current))
        })
    }
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for Waiter<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::driver::{MockChange, MockDriver, MockElement};
    use std::sync::Arc;

    mod wait_options {
        use super::*;

        #[test]
        fn test_default() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout(), Duration::from_secs(60));
            assert_eq!(options.poll_interval(), Duration::from_millis(500));
        }

        #[test]
        fn test_from_seconds() {
            let options = WaitOptions::from_seconds(5);
            assert_eq!(options.timeout_ms, 5000);
        }

        #[test]
        fn test_builders() {
            let options = WaitOptions::new()
                .with_timeout(1000)
                .with_poll_interval(100);
            assert_eq!(options.timeout_ms, 1000);
            assert_eq!(options.poll_interval_ms, 100);
        }
    }

    mod waiter {
        use super::*;

        #[test]
        fn test_presence_immediate() {
            let clock = FakeClock::new();
            let sel = Selector::flash_message();
            let driver = MockDriver::new().with_element(sel.clone(), MockElement::text("div", ""));
            Waiter::new(&driver, &clock, WaitOptions::from_seconds(5))
                .for_presence(&sel)
                .unwrap();
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_presence_after_delay() {
            let clock = FakeClock::shared();
            let sel = Selector::results_table();
            let mut driver = MockDriver::new().with_clock(Arc::clone(&clock));
            driver.schedule(
                Duration::from_millis(1200),
                sel.clone(),
                MockChange::Show(MockElement::text("table", "")),
            );
            Waiter::new(&driver, &*clock, WaitOptions::from_seconds(5))
                .for_presence(&sel)
                .unwrap();
            assert_eq!(clock.now(), Duration::from_millis(1500));
        }

        #[test]
        fn test_presence_times_out() {
            let clock = FakeClock::new();
            let driver = MockDriver::new();
            let err = Waiter::new(&driver, &clock, WaitOptions::from_seconds(2))
                .for_presence(&Selector::flash_message())
                .unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 2000, .. }));
            assert!(err.to_string().contains("#flash_message"));
            assert_eq!(clock.now(), Duration::from_secs(2));
        }

        #[test]
        fn test_for_text() {
            let clock = FakeClock::shared();
            let sel = Selector::flash_message();
            let mut driver = MockDriver::new()
                .with_clock(Arc::clone(&clock))
                .with_element(sel.clone(), MockElement::text("div", ""));
            driver.schedule(
                Duration::from_secs(1),
                sel.clone(),
                MockChange::Text("Success".into()),
            );
            let text = Waiter::new(&driver, &*clock, WaitOptions::from_seconds(5))
                .for_text(&sel, "Success")
                .unwrap();
            assert_eq!(text, "Success");
        }

        #[test]
        fn test_for_value() {
            let clock = FakeClock::new();
            let sel = Selector::field("Name");
            let driver = MockDriver::new().with_element(sel.clone(), MockElement::input("Hammer"));
            let value = Waiter::new(&driver, &clock, WaitOptions::from_seconds(1))
                .for_value(&sel, "Ham")
                .unwrap();
            assert_eq!(value, "Hammer");
        }

        #[test]
        fn test_other_errors_end_the_wait() {
            let clock = FakeClock::new();
            let driver = MockDriver::new();
            let err = Waiter::new(&driver, &clock, WaitOptions::from_seconds(10))
                .until::<(), _>("never", |_| Err(ProbeError::assertion("boom")))
                .unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
            assert_eq!(clock.sleep_count(), 0);
        }
    }
}
