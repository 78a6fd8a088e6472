//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// One or more route checks failed
    #[error("{failed} of {total} route checks failed")]
    ChecksFailed {
        /// Failed checks
        failed: usize,
        /// Checks run
        total: usize,
    },

    /// A filter selected no checks
    #[error("no route checks match '{filter}'")]
    NoChecksSelected {
        /// Filter given
        filter: String,
    },

    /// Service never reported healthy
    #[error("service unhealthy: {0}")]
    Unhealthy(#[from] catalog_probe::RetryError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Library error
    #[error("{0}")]
    Probe(#[from] catalog_probe::ProbeError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
