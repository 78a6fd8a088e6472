//! Bounded-retry assertions for asynchronously rendered regions.
//!
//! A search round-trip updates the results panel some time after the click
//! that triggered it, so a single read races the render. [`BoundedRetry`]
//! samples the region a fixed number of times with a fixed delay between
//! samples and stops at the first sample that meets the [`Expectation`].
//!
//! The loop moves through three states: polling, then either matched or
//! exhausted. Per-attempt failures (region missing, text not there yet) are
//! handed to the [`AttemptObserver`] and swallowed; only the exhausted state
//! surfaces an error, as a single [`RetryError`].

use crate::clock::Clock;
use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Attempts made when checking the search results region
pub const RESULTS_ATTEMPTS: usize = 3;

/// Delay between attempts when checking the search results region
pub const RESULTS_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Number of samples and the pause between them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudget {
    /// Maximum number of samples
    pub attempts: usize,
    /// Pause between consecutive samples
    pub delay: Duration,
}

impl RetryBudget {
    /// Budget for the search results region
    pub const RESULTS: Self = Self {
        attempts: RESULTS_ATTEMPTS,
        delay: RESULTS_RETRY_DELAY,
    };

    /// A single sample, no waiting
    pub const SINGLE: Self = Self {
        attempts: 1,
        delay: Duration::ZERO,
    };
}

/// Budget used by the search results checks
pub const RESULTS_RETRY_BUDGET: RetryBudget = RetryBudget::RESULTS;

impl Default for RetryBudget {
    fn default() -> Self {
        Self::RESULTS
    }
}

/// What the sampled text must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// Text must contain the substring
    Contains(String),
    /// Text must not contain the substring
    Absent(String),
}

impl Expectation {
    /// Create a `Contains` expectation
    #[must_use]
    pub fn contains(needle: impl Into<String>) -> Self {
        Self::Contains(needle.into())
    }

    /// Create an `Absent` expectation
    #[must_use]
    pub fn absent(needle: impl Into<String>) -> Self {
        Self::Absent(needle.into())
    }

    /// The substring being looked for
    #[must_use]
    pub fn needle(&self) -> &str {
        match self {
            Self::Contains(n) | Self::Absent(n) => n,
        }
    }

    /// Check a sample against the expectation
    #[must_use]
    pub fn is_met(&self, text: &str) -> bool {
        match self {
            Self::Contains(n) => text.contains(n.as_str()),
            Self::Absent(n) => !text.contains(n.as_str()),
        }
    }
}

/// Result of one sample
#[derive(Debug)]
pub enum AttemptOutcome<'a> {
    /// Target resolved and the expectation holds
    Matched(&'a str),
    /// Target resolved but the expectation does not hold yet
    Observed(&'a str),
    /// Target could not be resolved
    Unavailable(&'a ProbeError),
}

/// One sample, as reported to an [`AttemptObserver`]
#[derive(Debug)]
pub struct AttemptReport<'a> {
    /// 1-based attempt number
    pub attempt: usize,
    /// Attempts in the budget
    pub of: usize,
    /// Name of the probe target
    pub target: &'a str,
    /// What the sample showed
    pub outcome: AttemptOutcome<'a>,
}

impl fmt::Display for AttemptReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (attempt {}/{}): ", self.target, self.attempt, self.of)?;
        match &self.outcome {
            AttemptOutcome::Matched(text) => write!(f, "matched [{text}]"),
            AttemptOutcome::Observed(text) => write!(f, "current [{text}]"),
            AttemptOutcome::Unavailable(err) => write!(f, "unavailable: {err}"),
        }
    }
}

/// Receives per-attempt diagnostics
pub trait AttemptObserver {
    /// Called once per sample
    fn attempt(&self, report: &AttemptReport<'_>);

    /// Called with extra context lines after an unmatched sample
    fn context(&self, attempt: usize, lines: &[String]) {
        let _ = (attempt, lines);
    }
}

/// Observer that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn attempt(&self, report: &AttemptReport<'_>) {
        match report.outcome {
            AttemptOutcome::Unavailable(err) => tracing::error!(
                probe = report.target,
                attempt = report.attempt,
                "error checking {} (attempt {}): {}",
                report.target,
                report.attempt,
                err
            ),
            AttemptOutcome::Matched(text) | AttemptOutcome::Observed(text) => tracing::info!(
                probe = report.target,
                attempt = report.attempt,
                "current {} (attempt {}): [{}]",
                report.target,
                report.attempt,
                text
            ),
        }
    }

    fn context(&self, attempt: usize, lines: &[String]) {
        tracing::info!(attempt, "table has {} rows", lines.len());
        for (idx, line) in lines.iter().enumerate() {
            tracing::info!(attempt, "row {idx} contents: [{line}]");
        }
    }
}

/// Observer that keeps every line in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    lines: Mutex<Vec<String>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl AttemptObserver for RecordingObserver {
    fn attempt(&self, report: &AttemptReport<'_>) {
        self.push(report.to_string());
    }

    fn context(&self, attempt: usize, lines: &[String]) {
        for line in lines {
            self.push(format!("context (attempt {attempt}): [{line}]"));
        }
    }
}

/// Successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Attempt on which the expectation held
    pub attempts: usize,
    /// Text observed on that attempt
    pub text: String,
}

/// Budget exhausted without the expectation holding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// Target resolved at least once but never contained the substring
    #[error("could not find '{expected}' after {attempts} attempts; last observed: '{last_observed}'")]
    ExpectationNotMet {
        /// Probe target
        target: String,
        /// Substring looked for
        expected: String,
        /// Attempts made
        attempts: usize,
        /// Text of the last successful read
        last_observed: String,
    },

    /// Target resolved at least once but always contained the substring
    #[error("'{unexpected}' still present after {attempts} attempts; last observed: '{last_observed}'")]
    UnexpectedText {
        /// Probe target
        target: String,
        /// Substring that should be gone
        unexpected: String,
        /// Attempts made
        attempts: usize,
        /// Text of the last successful read
        last_observed: String,
    },

    /// Target never resolved
    #[error("target '{target}' not found after {attempts} attempts: {last_error}")]
    TargetUnavailable {
        /// Probe target
        target: String,
        /// Attempts made
        attempts: usize,
        /// Resolution error of the last attempt
        last_error: String,
    },
}

impl RetryError {
    /// Whether the target never resolved
    #[must_use]
    pub const fn is_target_unavailable(&self) -> bool {
        matches!(self, Self::TargetUnavailable { .. })
    }

    /// Attempts made before giving up
    #[must_use]
    pub const fn attempts(&self) -> usize {
        match self {
            Self::ExpectationNotMet { attempts, .. }
            | Self::UnexpectedText { attempts, .. }
            | Self::TargetUnavailable { attempts, .. } => *attempts,
        }
    }
}

/// A bounded polling assertion over one probe target
///
/// ## Example
///
/// ```ignore
/// let outcome = BoundedRetry::new("search_results", Expectation::contains("Widget"))
///     .with_clock(&clock)
///     .with_observer(&observer)
///     .verify(|| driver.text(&Selector::search_results()))?;
/// ```
pub struct BoundedRetry<'a> {
    target: String,
    expectation: Expectation,
    budget: RetryBudget,
    clock: &'a dyn Clock,
    observer: &'a dyn AttemptObserver,
}

static SYSTEM_CLOCK: std::sync::OnceLock<crate::clock::SystemClock> = std::sync::OnceLock::new();

impl<'a> BoundedRetry<'a> {
    /// Create an assertion with the results budget, the system clock and
    /// tracing diagnostics
    #[must_use]
    pub fn new(target: impl Into<String>, expectation: Expectation) -> Self {
        Self {
            target: target.into(),
            expectation,
            budget: RetryBudget::RESULTS,
            clock: SYSTEM_CLOCK.get_or_init(crate::clock::SystemClock::new),
            observer: &TracingObserver,
        }
    }

    /// Sleep through `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Report attempts to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn AttemptObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Use a different budget
    #[must_use]
    pub(crate) fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }

    /// The budget in effect
    #[must_use]
    pub const fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Sample `resolve` until the expectation holds or the budget runs out
    pub fn verify<R>(&self, resolve: R) -> Result<RetryOutcome, RetryError>
    where
        R: FnMut() -> ProbeResult<String>,
    {
        self.verify_with_context(resolve, || Ok(Vec::new()))
    }

    /// Like [`verify`](Self::verify), also passing `context` lines to the
    /// observer after every sample that resolved but did not match
    pub fn verify_with_context<R, C>(
        &self,
        mut resolve: R,
        mut context: C,
    ) -> Result<RetryOutcome, RetryError>
    where
        R: FnMut() -> ProbeResult<String>,
        C: FnMut() -> ProbeResult<Vec<String>>,
    {
        let attempts = self.budget.attempts.max(1);
        let mut last_text: Option<String> = None;
        let mut last_error: Option<ProbeError> = None;

        for attempt in 1..=attempts {
            match resolve() {
                Ok(text) => {
                    if self.expectation.is_met(&text) {
                        self.report(attempt, attempts, AttemptOutcome::Matched(&text));
                        return Ok(RetryOutcome {
                            attempts: attempt,
                            text,
                        });
                    }
                    self.report(attempt, attempts, AttemptOutcome::Observed(&text));
                    match context() {
                        Ok(lines) if !lines.is_empty() => self.observer.context(attempt, &lines),
                        Ok(_) => {}
                        Err(e) => tracing::debug!("no context for attempt {attempt}: {e}"),
                    }
                    last_text = Some(text);
                }
                Err(e) => {
                    self.report(attempt, attempts, AttemptOutcome::Unavailable(&e));
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                self.clock.sleep(self.budget.delay);
            }
        }

        Err(self.exhausted(attempts, last_text, last_error))
    }

    fn report(&self, attempt: usize, of: usize, outcome: AttemptOutcome<'_>) {
        self.observer.attempt(&AttemptReport {
            attempt,
            of,
            target: &self.target,
            outcome,
        });
    }

    fn exhausted(
        &self,
        attempts: usize,
        last_text: Option<String>,
        last_error: Option<ProbeError>,
    ) -> RetryError {
        let Some(last_observed) = last_text else {
            return RetryError::TargetUnavailable {
                target: self.target.clone(),
                attempts,
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            };
        };
        match &self.expectation {
            Expectation::Contains(expected) => RetryError::ExpectationNotMet {
                target: self.target.clone(),
                expected: expected.clone(),
                attempts,
                last_observed,
            },
            Expectation::Absent(unexpected) => RetryError::UnexpectedText {
                target: self.target.clone(),
                unexpected: unexpected.clone(),
                attempts,
                last_observed,
            },
        }
    }
}

impl fmt::Debug for BoundedRetry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRetry")
            .field("target", &self.target)
            .field("expectation", &self.expectation)
            .field("budget", &self.budget)
            .finish()
    }
}

/// Poll `target` on `driver` with the results budget until it contains
/// `expected`
pub fn assert_eventually<D: PageDriver + ?Sized>(
    driver: &D,
    target: &Selector,
    expected: &str,
    clock: &dyn Clock,
    observer: &dyn AttemptObserver,
) -> Result<RetryOutcome, RetryError> {
    BoundedRetry::new(target.to_css(), Expectation::contains(expected))
        .with_clock(clock)
        .with_observer(observer)
        .verify(|| driver.text(target))
}
