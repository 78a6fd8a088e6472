//! Typed client for the catalog REST API.
//!
//! Requests go through a [`Transport`] so the same client and route checks
//! run over real HTTP ([`HttpTransport`]) or against
//! [`super::InMemoryCatalog`].

use super::model::{Product, ProductQuery};
use crate::result::{ProbeError, ProbeResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Collection path for products
pub const PRODUCTS_PATH: &str = "/products";

/// Health endpoint path
pub const HEALTH_PATH: &str = "/health";

/// JSON content type
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request relative to the service root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub content_type: Option<String>,
}

impl ApiRequest {
    /// Request with no body
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body
    pub fn with_json<T: Serialize>(self, body: &T) -> ProbeResult<Self> {
        Ok(self.with_body(serde_json::to_string(body)?, JSON_CONTENT_TYPE))
    }

    /// Attach a raw body with an explicit content type
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    /// Append query-string pairs
    #[must_use]
    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }
}

/// A response as seen by the checks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    /// Response with a status and body
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Header value by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> ProbeResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// The `message` field of a JSON body, if any
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value.get("message")?.as_str().map(str::to_string)
    }
}

/// Sends requests to the catalog service
pub trait Transport {
    /// Perform one request
    fn send(&self, request: &ApiRequest) -> ProbeResult<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> ProbeResult<ApiResponse> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport over reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Transport rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> ProbeResult<Self> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Transport rooted at `base_url` with a request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ProbeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Service root
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> ProbeResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        tracing::debug!("{} {url}", request.method);

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref content_type) = request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text()?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Fail unless `response` has status `expected`
pub fn expect_status(
    request: &ApiRequest,
    response: &ApiResponse,
    expected: u16,
) -> ProbeResult<()> {
    if response.status == expected {
        Ok(())
    } else {
        Err(ProbeError::UnexpectedStatus {
            method: request.method.to_string(),
            path: request.path.clone(),
            expected,
            actual: response.status,
        })
    }
}

/// A product created by the service together with its `Location`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub product: Product,
    pub location: Option<String>,
}

/// Typed operations on the products resource
#[derive(Debug, Clone)]
pub struct CatalogClient<T: Transport> {
    transport: T,
}

impl<T: Transport> CatalogClient<T> {
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a raw request
    pub fn send(&self, request: &ApiRequest) -> ProbeResult<ApiResponse> {
        self.transport.send(request)
    }

    fn send_expecting(&self, request: &ApiRequest, expected: u16) -> ProbeResult<ApiResponse> {
        let response = self.send(request)?;
        expect_status(request, &response, expected)?;
        Ok(response)
    }

    /// `GET /`
    pub fn index(&self) -> ProbeResult<ApiResponse> {
        self.send(&ApiRequest::get("/"))
    }

    /// `GET /health`, returning the reported message
    pub fn health(&self) -> ProbeResult<String> {
        let response = self.send_expecting(&ApiRequest::get(HEALTH_PATH), 200)?;
        response.message().ok_or_else(|| {
            ProbeError::assertion(format!("health body has no message: {}", response.body))
        })
    }

    /// `POST /products`
    pub fn create(&self, product: &Product) -> ProbeResult<Created> {
        let request = ApiRequest::post(PRODUCTS_PATH).with_json(product)?;
        let response = self.send_expecting(&request, 201)?;
        Ok(Created {
            product: response.json()?,
            location: response.header("location").map(str::to_string),
        })
    }

    /// `GET /products/{id}`
    pub fn get(&self, id: u64) -> ProbeResult<Product> {
        self.send_expecting(&ApiRequest::get(product_path(id)), 200)?
            .json()
    }

    /// `PUT /products/{id}`
    pub fn update(&self, id: u64, product: &Product) -> ProbeResult<Product> {
        let request = ApiRequest::put(product_path(id)).with_json(product)?;
        self.send_expecting(&request, 200)?.json()
    }

    /// `DELETE /products/{id}`
    pub fn delete(&self, id: u64) -> ProbeResult<()> {
        self.send_expecting(&ApiRequest::delete(product_path(id)), 204)
            .map(|_| ())
    }

    /// `GET /products` with an optional filter
    pub fn list(&self, query: &ProductQuery) -> ProbeResult<Vec<Product>> {
        let request = ApiRequest::get(PRODUCTS_PATH).with_query(query.pairs());
        self.send_expecting(&request, 200)?.json()
    }

    /// Delete every product, returning how many were removed
    pub fn delete_all(&self) -> ProbeResult<usize> {
        let products = self.list(&ProductQuery::All)?;
        let mut removed = 0;
        for id in products.iter().filter_map(|p| p.id) {
            self.delete(id)?;
            removed += 1;
        }
        tracing::debug!("removed {removed} products");
        Ok(removed)
    }
}

/// Path of a single product
#[must_use]
pub fn product_path(id: u64) -> String {
    format!("{PRODUCTS_PATH}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::post(PRODUCTS_PATH)
            .with_json(&serde_json::json!({"name": "x"}))
            .unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"x"}"#));

        let req = ApiRequest::get(PRODUCTS_PATH).with_query(vec![("name".into(), "Hat".into())]);
        assert_eq!(req.query.len(), 1);
    }

    #[test]
    fn test_response_headers_case_insensitive() {
        let resp = ApiResponse::new(201, "").with_header("Location", "/products/1");
        assert_eq!(resp.header("location"), Some("/products/1"));
        assert_eq!(resp.header("LOCATION"), Some("/products/1"));
    }

    #[test]
    fn test_response_message() {
        assert_eq!(
            ApiResponse::new(200, r#"{"message":"OK"}"#).message().as_deref(),
            Some("OK")
        );
        assert!(ApiResponse::new(200, "<html>").message().is_none());
    }

    #[test]
    fn test_expect_status() {
        let req = ApiRequest::delete("/products/3");
        assert!(expect_status(&req, &ApiResponse::new(204, ""), 204).is_ok());
        let err = expect_status(&req, &ApiResponse::new(404, ""), 204).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::UnexpectedStatus { expected: 204, actual: 404, .. }
        ));
    }

    #[test]
    fn test_product_path() {
        assert_eq!(product_path(0), "/products/0");
    }

    #[test]
    fn test_http_transport_trims_base() {
        let t = HttpTransport::new("http://localhost:8080/").unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080");
    }

    mod http {
        use super::*;
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;
        use std::thread::{self, JoinHandle};

        /// Serve `response` to one connection; the handle yields the raw request
        fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let handle = thread::spawn(move || {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut head = String::new();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                    let end = line == "\r\n";
                    head.push_str(&line);
                    if end {
                        break;
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).unwrap();
                stream.write_all(response.as_bytes()).unwrap();
                head + &String::from_utf8(body).unwrap()
            });
            (base_url, handle)
        }

        #[test]
        fn test_query_is_encoded() {
            let (base, server) = serve_once(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                 Content-Length: 2\r\nConnection: close\r\n\r\n[]",
            );
            let client = CatalogClient::new(HttpTransport::new(base).unwrap());
            let products = client.list(&ProductQuery::Name("Big Hat".into())).unwrap();
            assert!(products.is_empty());

            let request = server.join().unwrap();
            assert!(request.starts_with("GET /products?name=Big+Hat HTTP/1.1"));
        }

        #[test]
        fn test_header_names_lowercased() {
            let (base, server) = serve_once(
                "HTTP/1.1 201 Created\r\nLocation: /products/7\r\nX-Request-Id: abc\r\n\
                 Content-Length: 0\r\nConnection: close\r\n\r\n",
            );
            let transport = HttpTransport::new(base).unwrap();
            let response = transport.send(&ApiRequest::post(PRODUCTS_PATH)).unwrap();
            server.join().unwrap();

            assert_eq!(response.status, 201);
            assert_eq!(
                response.headers.get("location").map(String::as_str),
                Some("/products/7")
            );
            assert!(response.headers.contains_key("x-request-id"));
            assert!(response.headers.keys().all(|k| *k == k.to_ascii_lowercase()));
        }

        #[test]
        fn test_no_content_has_empty_body() {
            let (base, server) =
                serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
            let client = CatalogClient::new(HttpTransport::new(base).unwrap());
            client.delete(3).unwrap();

            let request = server.join().unwrap();
            assert!(request.starts_with("DELETE /products/3 HTTP/1.1"));
        }

        #[test]
        fn test_json_body_and_content_type_sent() {
            let (base, server) = serve_once(
                "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            let transport = HttpTransport::new(base).unwrap();
            let request = ApiRequest::post(PRODUCTS_PATH)
                .with_json(&serde_json::json!({"name": "Hammer"}))
                .unwrap();
            let response = transport.send(&request).unwrap();
            assert_eq!(response.status, 400);
            assert_eq!(response.body, "");

            let raw = server.join().unwrap().to_ascii_lowercase();
            assert!(raw.contains("content-type: application/json"));
            assert!(raw.ends_with(r#"{"name":"hammer"}"#));
        }
    }
}
