//! Result and error types for catalog-probe.

use thiserror::Error;

/// Result type for catalog-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the catalog UI or API
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No element matched the selector
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that failed to resolve
        selector: String,
    },

    /// Element exists but cannot take the requested interaction
    #[error("Element {selector} does not support {operation}")]
    UnsupportedInteraction {
        /// Selector of the element
        selector: String,
        /// Attempted operation
        operation: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Condition that never held
        condition: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Bounded-retry assertion exhausted its budget
    #[error(transparent)]
    Retry(#[from] crate::assertion::RetryError),

    /// HTTP transport failure
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message
        message: String,
    },

    /// Service answered with an unexpected status
    #[error("Unexpected status {actual} from {method} {path} (expected {expected})")]
    UnexpectedStatus {
        /// HTTP method
        method: String,
        /// Request path
        path: String,
        /// Expected status code
        expected: u16,
        /// Received status code
        actual: u16,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means the element is not (yet) in the document
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            message: err.to_string(),
        }
    }
}
