//! Product Catalog REST API: wire model, client, in-memory double and route
//! checks.

mod client;
mod factory;
mod memory;
mod model;
mod routes;

pub use client::{
    expect_status, product_path, ApiRequest, ApiResponse, CatalogClient, Created, HttpTransport,
    Method, Transport, HEALTH_PATH, JSON_CONTENT_TYPE, PRODUCTS_PATH,
};
pub use factory::ProductFactory;
pub use memory::{InMemoryCatalog, INDEX_TITLE};
pub use model::{Category, InvalidPrice, Price, Product, ProductQuery, UnknownCategory};
pub use routes::{wait_for_health, CheckReport, RouteCheck, RouteSuite, SuiteReport};
