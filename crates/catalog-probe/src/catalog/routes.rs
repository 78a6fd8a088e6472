//! Route checks against the catalog REST API.
//!
//! Each [`RouteCheck`] starts from an empty catalog, exercises one route and
//! reports pass or fail. [`RouteSuite`] runs them in order and collects a
//! [`SuiteReport`].

use super::client::{
    expect_status, product_path, ApiRequest, CatalogClient, Transport, PRODUCTS_PATH,
};
use super::factory::ProductFactory;
use super::memory::INDEX_TITLE;
use super::model::{Product, ProductQuery};
use crate::assertion::{
    AttemptObserver, BoundedRetry, Expectation, RetryBudget, RetryError, RetryOutcome,
    RESULTS_RETRY_DELAY,
};
use crate::clock::Clock;
use crate::result::{ProbeError, ProbeResult};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// One route-level expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCheck {
    Index,
    Health,
    Create,
    Get,
    GetNotFound,
    Update,
    Delete,
    List,
    ByName,
    ByCategory,
    ByAvailability,
    MethodNotAllowed,
    BadRequest,
    UnsupportedMediaType,
}

impl RouteCheck {
    /// Every check in run order
    pub const ALL: [Self; 14] = [
        Self::Index,
        Self::Health,
        Self::Create,
        Self::Get,
        Self::GetNotFound,
        Self::Update,
        Self::Delete,
        Self::List,
        Self::ByName,
        Self::ByCategory,
        Self::ByAvailability,
        Self::MethodNotAllowed,
        Self::BadRequest,
        Self::UnsupportedMediaType,
    ];

    /// Short name used for filtering and reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Health => "health",
            Self::Create => "create",
            Self::Get => "get",
            Self::GetNotFound => "get_not_found",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
            Self::ByName => "by_name",
            Self::ByCategory => "by_category",
            Self::ByAvailability => "by_availability",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::BadRequest => "bad_request",
            Self::UnsupportedMediaType => "unsupported_media_type",
        }
    }

    /// What the check expects
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Index => "It should return the index page",
            Self::Health => "It should be healthy",
            Self::Create => "It should Create a new Product",
            Self::Get => "It should Get a single Product",
            Self::GetNotFound => "It should not Get a Product thats not found",
            Self::Update => "It should Update an existing Product",
            Self::Delete => "It should Delete a Product",
            Self::List => "It should Get a list of Products",
            Self::ByName => "It should Get a Product by Name",
            Self::ByCategory => "It should Get a Product by Category",
            Self::ByAvailability => "It should Get a Product by Availability",
            Self::MethodNotAllowed => "It should not allow an illegal method call",
            Self::BadRequest => "It should return a bad request error",
            Self::UnsupportedMediaType => "It should return unsupported media type",
        }
    }
}

impl fmt::Display for RouteCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub check: RouteCheck,
    pub description: &'static str,
    pub passed: bool,
    /// Failure reason; empty on success
    pub message: String,
    pub duration_ms: u64,
}

/// Outcome of a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub checks: Vec<CheckReport>,
}

impl SuiteReport {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message()))
    }
}

/// Runs route checks through a [`CatalogClient`]
#[derive(Debug)]
pub struct RouteSuite<T: Transport> {
    client: CatalogClient<T>,
    seed: u64,
}

impl<T: Transport> RouteSuite<T> {
    /// Suite over `transport` with the default sample seed
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            client: CatalogClient::new(transport),
            seed: 0x5EED,
        }
    }

    /// Use a different seed for sample products
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The client checks run through
    pub const fn client(&self) -> &CatalogClient<T> {
        &self.client
    }

    /// Run every check
    pub fn run_all(&self) -> SuiteReport {
        self.run_filtered(None)
    }

    /// Run checks whose name contains `filter`
    pub fn run_filtered(&self, filter: Option<&str>) -> SuiteReport {
        let checks = RouteCheck::ALL
            .into_iter()
            .filter(|c| filter.map_or(true, |f| c.name().contains(f)))
            .map(|c| self.run(c))
            .collect();
        SuiteReport { checks }
    }

    /// Run one check from an empty catalog
    pub fn run(&self, check: RouteCheck) -> CheckReport {
        let started = Instant::now();
        let result = self.client.delete_all().and_then(|_| self.execute(check));
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(()) => {
                tracing::info!(check = check.name(), "passed");
                CheckReport {
                    check,
                    description: check.description(),
                    passed: true,
                    message: String::new(),
                    duration_ms,
                }
            }
            Err(e) => {
                tracing::warn!(check = check.name(), "failed: {e}");
                CheckReport {
                    check,
                    description: check.description(),
                    passed: false,
                    message: e.to_string(),
                    duration_ms,
                }
            }
        }
    }

    fn factory(&self) -> ProductFactory {
        ProductFactory::new(self.seed)
    }

    fn create_products(&self, count: usize) -> ProbeResult<Vec<Product>> {
        self.factory()
            .batch(count)
            .into_iter()
            .map(|p| {
                let created = self.client.create(&p)?;
                Ok(created.product)
            })
            .collect()
    }

    fn execute(&self, check: RouteCheck) -> ProbeResult<()> {
        match check {
            RouteCheck::Index => self.check_index(),
            RouteCheck::Health => self.check_health(),
            RouteCheck::Create => self.check_create(),
            RouteCheck::Get => self.check_get(),
            RouteCheck::GetNotFound => self.check_get_not_found(),
            RouteCheck::Update => self.check_update(),
            RouteCheck::Delete => self.check_delete(),
            RouteCheck::List => self.check_list(),
            RouteCheck::ByName => self.check_filter(3, |p| ProductQuery::Name(p.name.clone())),
            RouteCheck::ByCategory => self.check_filter(10, |p| ProductQuery::Category(p.category)),
            RouteCheck::ByAvailability => {
                self.check_filter(10, |p| ProductQuery::Available(p.available))
            }
            RouteCheck::MethodNotAllowed => self.check_method_not_allowed(),
            RouteCheck::BadRequest => self.check_bad_request(),
            RouteCheck::UnsupportedMediaType => self.check_unsupported_media_type(),
        }
    }

    fn check_index(&self) -> ProbeResult<()> {
        let request = ApiRequest::get("/");
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 200)?;
        ensure(response.body.contains(INDEX_TITLE), || {
            format!("index page does not mention '{INDEX_TITLE}'")
        })
    }

    fn check_health(&self) -> ProbeResult<()> {
        let message = self.client.health()?;
        ensure(message == "OK", || format!("health reported '{message}'"))
    }

    fn check_create(&self) -> ProbeResult<()> {
        let product = ProductFactory::product(&mut self.factory());
        let created = self.client.create(&product)?;
        ensure(created.location.is_some(), || {
            "create response has no Location header".to_string()
        })?;
        ensure(created.product.same_fields(&product), || {
            format!("created {:?}, service echoed {:?}", product, created.product)
        })
    }

    fn check_get(&self) -> ProbeResult<()> {
        let product = self.first_created()?;
        let fetched = self.client.get(id_of(&product)?)?;
        ensure(fetched.name == product.name, || {
            format!("expected name '{}', got '{}'", product.name, fetched.name)
        })
    }

    fn check_get_not_found(&self) -> ProbeResult<()> {
        let request = ApiRequest::get(product_path(0));
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 404)?;
        let message = response.message().unwrap_or_default();
        ensure(message.contains("was not found"), || {
            format!("404 message was '{message}'")
        })
    }

    fn check_update(&self) -> ProbeResult<()> {
        let mut product = self.first_created()?;
        product.description = "updated description".to_string();
        let updated = self.client.update(id_of(&product)?, &product)?;
        ensure(updated.description == "updated description", || {
            format!("description after update was '{}'", updated.description)
        })
    }

    fn check_delete(&self) -> ProbeResult<()> {
        let product = self.first_created()?;
        let id = id_of(&product)?;

        let request = ApiRequest::delete(product_path(id));
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 204)?;
        ensure(response.body.is_empty(), || {
            format!("delete returned a body: {}", response.body)
        })?;

        let request = ApiRequest::get(product_path(id));
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 404)
    }

    fn check_list(&self) -> ProbeResult<()> {
        self.create_products(5)?;
        let products = self.client.list(&ProductQuery::All)?;
        ensure(products.len() == 5, || {
            format!("expected 5 products, got {}", products.len())
        })
    }

    fn check_filter<F>(&self, count: usize, query_for: F) -> ProbeResult<()>
    where
        F: Fn(&Product) -> ProductQuery,
    {
        let products = self.create_products(count)?;
        let first = products
            .first()
            .ok_or_else(|| ProbeError::assertion("no products created"))?;
        let query = query_for(first);
        let expected = products.iter().filter(|p| query.matches(p)).count();
        let found = self.client.list(&query)?;
        ensure(found.len() == expected, || {
            format!("{query:?}: expected {expected} products, got {}", found.len())
        })?;
        ensure(found.iter().all(|p| query.matches(p)), || {
            format!("{query:?}: response contains non-matching products")
        })
    }

    fn check_method_not_allowed(&self) -> ProbeResult<()> {
        for request in [ApiRequest::put(PRODUCTS_PATH), ApiRequest::delete(PRODUCTS_PATH)] {
            let response = self.client.send(&request)?;
            expect_status(&request, &response, 405)?;
        }
        Ok(())
    }

    fn check_bad_request(&self) -> ProbeResult<()> {
        let request =
            ApiRequest::post(PRODUCTS_PATH).with_json(&serde_json::json!({"name": "bad data"}))?;
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 400)
    }

    fn check_unsupported_media_type(&self) -> ProbeResult<()> {
        let request = ApiRequest::post(PRODUCTS_PATH)
            .with_body(r#"{"name": "bad data"}"#, "test/html");
        let response = self.client.send(&request)?;
        expect_status(&request, &response, 415)
    }

    fn first_created(&self) -> ProbeResult<Product> {
        self.create_products(1)?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::assertion("no products created"))
    }
}

fn id_of(product: &Product) -> ProbeResult<u64> {
    product
        .id
        .ok_or_else(|| ProbeError::assertion("service did not assign an id"))
}

/// Poll `/health` until it reports `OK`, one second apart
pub fn wait_for_health<T: Transport>(
    client: &CatalogClient<T>,
    attempts: usize,
    clock: &dyn Clock,
    observer: &dyn AttemptObserver,
) -> Result<RetryOutcome, RetryError> {
    BoundedRetry::new("/health", Expectation::contains("OK"))
        .with_clock(clock)
        .with_observer(observer)
        .with_budget(RetryBudget {
            attempts,
            delay: RESULTS_RETRY_DELAY,
        })
        .verify(|| client.health())
}
