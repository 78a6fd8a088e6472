//! In-process stand-in for the catalog service.
//!
//! Answers the same routes with the same status codes and message bodies
//! as the real service, so route checks and the CLI can be exercised
//! without a network.

use super::client::{
    ApiRequest, ApiResponse, Method, Transport, HEALTH_PATH, JSON_CONTENT_TYPE, PRODUCTS_PATH,
};
use super::model::{Category, Product, ProductQuery};
use crate::result::ProbeResult;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Title rendered by the index page
pub const INDEX_TITLE: &str = "Product Catalog Administration";

#[derive(Debug, Default)]
struct Store {
    products: BTreeMap<u64, Product>,
    next_id: u64,
}

/// Catalog service held in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    store: Mutex<Store>,
}

fn message(status: u16, text: impl Into<String>) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": text.into() }).to_string())
        .with_header("content-type", JSON_CONTENT_TYPE)
}

fn json_response<T: serde::Serialize>(status: u16, body: &T) -> ProbeResult<ApiResponse> {
    Ok(ApiResponse::new(status, serde_json::to_string(body)?)
        .with_header("content-type", JSON_CONTENT_TYPE))
}

fn not_found(id: u64) -> ApiResponse {
    message(404, format!("Product with id '{id}' was not found."))
}

fn method_not_allowed(request: &ApiRequest) -> ApiResponse {
    message(
        405,
        format!("Method {} not allowed on {}", request.method, request.path),
    )
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.lock().map(|s| s.products.len()).unwrap_or_default()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn route(request: &ApiRequest, store: &mut Store) -> ProbeResult<ApiResponse> {
        let path = request.path.trim_end_matches('/');
        match path {
            "" => Ok(match request.method {
                Method::Get => ApiResponse::new(
                    200,
                    format!(
                        "<!DOCTYPE html><html><head><title>{INDEX_TITLE}</title></head>\
                         <body><h1>{INDEX_TITLE}</h1></body></html>"
                    ),
                )
                .with_header("content-type", "text/html; charset=utf-8"),
                _ => method_not_allowed(request),
            }),
            HEALTH_PATH => Ok(match request.method {
                Method::Get => message(200, "OK"),
                _ => method_not_allowed(request),
            }),
            PRODUCTS_PATH => match request.method {
                Method::Get => Self::list(request, store),
                Method::Post => Self::create(request, store),
                Method::Put | Method::Delete => Ok(method_not_allowed(request)),
            },
            _ => {
                let Some(id) = path
                    .strip_prefix(PRODUCTS_PATH)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .and_then(|id| id.parse::<u64>().ok())
                else {
                    return Ok(message(404, "Not Found"));
                };
                match request.method {
                    Method::Get => match store.products.get(&id) {
                        Some(product) => json_response(200, product),
                        None => Ok(not_found(id)),
                    },
                    Method::Put => Self::update(id, request, store),
                    Method::Delete => {
                        store.products.remove(&id);
                        Ok(ApiResponse::new(204, ""))
                    }
                    Method::Post => Ok(method_not_allowed(request)),
                }
            }
        }
    }

    fn parse_body(request: &ApiRequest) -> Result<Product, ApiResponse> {
        let content_type = request.content_type.as_deref().unwrap_or_default();
        if !content_type.starts_with(JSON_CONTENT_TYPE) {
            return Err(message(
                415,
                format!("Content-Type must be {JSON_CONTENT_TYPE}"),
            ));
        }
        let body = request.body.as_deref().unwrap_or_default();
        serde_json::from_str(body)
            .map_err(|e| message(400, format!("Invalid product: {e}")))
    }

    fn create(request: &ApiRequest, store: &mut Store) -> ProbeResult<ApiResponse> {
        let product = match Self::parse_body(request) {
            Ok(p) => p,
            Err(response) => return Ok(response),
        };
        store.next_id += 1;
        let id = store.next_id;
        let product = product.with_id(id);
        store.products.insert(id, product.clone());
        tracing::debug!("created product {id}");
        Ok(json_response(201, &product)?.with_header("location", super::product_path(id)))
    }

    fn update(id: u64, request: &ApiRequest, store: &mut Store) -> ProbeResult<ApiResponse> {
        if !store.products.contains_key(&id) {
            return Ok(not_found(id));
        }
        let product = match Self::parse_body(request) {
            Ok(p) => p.with_id(id),
            Err(response) => return Ok(response),
        };
        store.products.insert(id, product.clone());
        json_response(200, &product)
    }

    fn list(request: &ApiRequest, store: &Store) -> ProbeResult<ApiResponse> {
        let query = match Self::parse_query(&request.query) {
            Ok(q) => q,
            Err(response) => return Ok(response),
        };
        let products: Vec<&Product> = store
            .products
            .values()
            .filter(|p| query.matches(p))
            .collect();
        json_response(200, &products)
    }

    fn parse_query(pairs: &[(String, String)]) -> Result<ProductQuery, ApiResponse> {
        for (key, value) in pairs {
            match key.as_str() {
                "name" => return Ok(ProductQuery::Name(value.clone())),
                "category" => {
                    return value
                        .parse::<Category>()
                        .map(ProductQuery::Category)
                        .map_err(|e| message(400, e.to_string()));
                }
                "available" => {
                    return match value.to_ascii_lowercase().as_str() {
                        "true" | "yes" | "1" => Ok(ProductQuery::Available(true)),
                        "false" | "no" | "0" => Ok(ProductQuery::Available(false)),
                        _ => Err(message(400, format!("invalid availability '{value}'"))),
                    };
                }
                _ => {}
            }
        }
        Ok(ProductQuery::All)
    }
}

impl Transport for InMemoryCatalog {
    fn send(&self, request: &ApiRequest) -> ProbeResult<ApiResponse> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| crate::result::ProbeError::Http {
                message: "catalog store poisoned".into(),
            })?;
        Self::route(request, &mut store)
    }
}
