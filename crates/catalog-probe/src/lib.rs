//! catalog-probe: acceptance steps and route checks for the Product Catalog
//!
//! The admin UI renders search results asynchronously, so the step library
//! checks them with a bounded-retry assertion (three samples, one second
//! apart) instead of a single read. Everything that touches the page goes
//! through [`PageDriver`], everything that sleeps through [`Clock`], and
//! per-attempt diagnostics through [`AttemptObserver`], so scenarios run
//! against [`MockDriver`] and [`FakeClock`] without a browser or real time.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │ WebSteps   │───►│ PageDriver │───►│ Chromium   │
//! │ (labels)   │    │ Mock / CDP │    │ (browser)  │
//! └─────┬──────┘    └────────────┘    └────────────┘
//!       │ BoundedRetry / Waiter
//!       ▼
//! ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │ RouteSuite │───►│ Transport  │───►│ Catalog    │
//! │ (checks)   │    │ HTTP / mem │    │ REST API   │
//! └────────────┘    └────────────┘    └────────────┘
//! ```

#![warn(missing_docs)]

/// Assertions, including the bounded-retry assertion
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod assertion;

/// Product Catalog REST API model, client and route checks
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    missing_docs
)]
pub mod catalog;

mod browser;
mod clock;
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod locator;
mod result;
#[allow(clippy::missing_errors_doc)]
mod steps;
mod wait;

pub use assertion::{
    assert_eventually, Assertion, AssertionResult, AttemptObserver, AttemptOutcome,
    AttemptReport, BoundedRetry, Expectation, RecordingObserver, RetryBudget, RetryError,
    RetryOutcome, TracingObserver, RESULTS_ATTEMPTS, RESULTS_RETRY_BUDGET, RESULTS_RETRY_DELAY,
};
pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::CdpDriver;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ProbeConfig, DEFAULT_BASE_URL, DEFAULT_WAIT_SECONDS};
pub use driver::{MockChange, MockDriver, MockElement, PageDriver};
pub use locator::{
    button_id, field_id, Selector, BUTTON_SUFFIX, FLASH_MESSAGE_ID, ID_PREFIX,
    RESULTS_TABLE_CLASS, SEARCH_RESULTS_ID,
};
pub use result::{ProbeError, ProbeResult};
pub use steps::{WebSteps, SEARCH_SETTLE_AFTER, SEARCH_SETTLE_BEFORE};
pub use wait::{WaitOptions, Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        assert_eventually, Assertion, AttemptObserver, BoundedRetry, Clock, Expectation,
        FakeClock, MockDriver, MockElement, PageDriver, ProbeConfig, ProbeError, ProbeResult,
        RetryBudget, RetryError, Selector, SystemClock, TracingObserver, WebSteps,
    };
    pub use super::catalog::{
        CatalogClient, HttpTransport, InMemoryCatalog, Product, RouteSuite, Transport,
    };
}
