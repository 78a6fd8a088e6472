//! Assertions for test validation.
//!
//! One-shot checks live here as [`Assertion`] helpers; the bounded polling
//! assertion for asynchronously rendered regions lives in [`retry`].

pub mod retry;

pub use retry::{
    assert_eventually, AttemptObserver, AttemptOutcome, AttemptReport, BoundedRetry,
    Expectation, RecordingObserver, RetryBudget, RetryError, RetryOutcome, TracingObserver,
    RESULTS_ATTEMPTS, RESULTS_RETRY_BUDGET, RESULTS_RETRY_DELAY,
};

use crate::result::{ProbeError, ProbeResult};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert into a [`ProbeResult`], failing with the message
    pub fn into_result(self) -> ProbeResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(ProbeError::assertion(self.message))
        }
    }
}

/// Assertion helpers for testing
#[derive(Debug)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a string does not contain a substring
    #[must_use]
    pub fn lacks(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::fail(format!("expected '{haystack}' not to contain '{needle}'"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }
}
