//! JSON HTTP surface over [`may_minihttp`].
//!
//! Routing is a plain function from method and request target to a [`Reply`],
//! so it can be tested without a socket. [`CatalogHttpService`] adapts it to
//! the server.

use crate::catalog::{AttributeSearch, CatalogService, ProductFilter, RowSource, SectionFilter};
use crate::error::CatalogError;
use may_minihttp::{HttpService, Request, Response};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use url::Url;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

const JSON: &str = "Content-Type: application/json";
#[cfg(feature = "metrics")]
const PROMETHEUS_TEXT: &str = "Content-Type: text/plain; version=0.0.4; charset=utf-8";

/// A fully rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: usize,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status: 200,
                reason: "OK",
                content_type: JSON,
                body,
            },
            Err(e) => {
                log::error!("failed to serialize response: {e}");
                Self::error(500, "Internal Server Error", "Internal server error")
            }
        }
    }

    fn error(status: usize, reason: &'static str, message: &str) -> Self {
        Self {
            status,
            reason,
            content_type: JSON,
            body: json!({ "error": message }).to_string().into_bytes(),
        }
    }

    fn from_catalog_error(err: &CatalogError) -> Self {
        match err {
            CatalogError::NotFound(message) => Self::error(404, "Not Found", message),
            CatalogError::InvalidRequest(message) => Self::error(400, "Bad Request", message),
            CatalogError::MalformedRow(_) | CatalogError::Store(_) => {
                log::error!("catalog request failed: {err}");
                Self::error(500, "Internal Server Error", "Internal server error")
            }
        }
    }

    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Route one request.
///
/// `target` is the raw request target, path plus optional query string.
pub fn route<S: RowSource>(catalog: &CatalogService<S>, method: &str, target: &str) -> Reply {
    if method != "GET" {
        return Reply::error(405, "Method Not Allowed", "Method not allowed");
    }

    let (path, params) = match parse_target(target) {
        Ok(parsed) => parsed,
        Err(message) => return Reply::error(400, "Bad Request", &message),
    };

    let result = match path.trim_end_matches('/') {
        "/health" => return health(catalog),
        #[cfg(feature = "metrics")]
        "/metrics" => {
            return Reply {
                status: 200,
                reason: "OK",
                content_type: PROMETHEUS_TEXT,
                body: crate::metrics::render(),
            }
        }
        "/api/products" => product_filter(&params).and_then(|f| catalog.list_products(&f)),
        "/api/products/section" => section_filter(&params).and_then(|f| catalog.list_section(&f)),
        "/api/products/search" => catalog.search_products(&attribute_search(&params)),
        other => match other.strip_prefix("/api/products/") {
            Some(id) if !id.contains('/') => {
                return match parse_id(id).and_then(|id| catalog.product_detail(id)) {
                    Ok(product) => Reply::ok(&product),
                    Err(e) => Reply::from_catalog_error(&e),
                };
            }
            _ => return Reply::error(404, "Not Found", "Not found"),
        },
    };

    match result {
        Ok(products) => Reply::ok(&products),
        Err(e) => Reply::from_catalog_error(&e),
    }
}

/// `200 {"status":"ok"}` while the store answers, `503` otherwise.
fn health<S: RowSource>(catalog: &CatalogService<S>) -> Reply {
    if catalog.is_healthy() {
        return Reply::ok(&json!({ "status": "ok" }));
    }
    Reply {
        status: 503,
        reason: "Service Unavailable",
        content_type: JSON,
        body: json!({ "status": "unavailable" }).to_string().into_bytes(),
    }
}

type Params = HashMap<String, String>;

/// Split a request target into its decoded path and query parameters. The
/// first occurrence of a repeated parameter wins.
fn parse_target(target: &str) -> Result<(String, Params), String> {
    let base = Url::parse("http://localhost/").map_err(|e| e.to_string())?;
    let url = base
        .join(target)
        .map_err(|e| format!("Invalid request target: {e}"))?;

    let mut params = Params::new();
    for (key, value) in url.query_pairs() {
        params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    Ok((url.path().to_string(), params))
}

fn product_filter(params: &Params) -> Result<ProductFilter, CatalogError> {
    Ok(ProductFilter {
        search_term: params.get("searchTerm").cloned(),
        gender: params.get("gender").cloned(),
        category: optional_id(params, "category")?,
        color: params.get("color").cloned(),
    })
}

fn section_filter(params: &Params) -> Result<SectionFilter, CatalogError> {
    SectionFilter::new(params.get("gender").cloned(), optional_id(params, "category")?)
}

fn attribute_search(params: &Params) -> AttributeSearch {
    AttributeSearch {
        color: params.get("color").cloned(),
        category: params.get("category").cloned(),
        gender: params.get("gender").cloned(),
    }
}

fn optional_id(params: &Params, key: &str) -> Result<Option<i32>, CatalogError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CatalogError::InvalidRequest(format!("Invalid {key}: {raw}"))),
    }
}

fn parse_id(raw: &str) -> Result<i32, CatalogError> {
    raw.parse()
        .map_err(|_| CatalogError::InvalidRequest(format!("Invalid product id: {raw}")))
}

/// [`HttpService`] over a shared [`CatalogService`].
pub struct CatalogHttpService<S> {
    catalog: Arc<CatalogService<S>>,
}

impl<S> CatalogHttpService<S> {
    pub fn new(catalog: Arc<CatalogService<S>>) -> Self {
        Self { catalog }
    }
}

impl<S> Clone for CatalogHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S: RowSource + Send + Sync + 'static> HttpService for CatalogHttpService<S> {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        #[cfg(feature = "metrics")]
        METRICS.record_http_request();

        let reply = route(&self.catalog, req.method(), req.path());
        log::info!("{} {} -> {}", req.method(), req.path(), reply.status);

        res.status_code(reply.status, reply.reason);
        res.header(reply.content_type);
        res.body_vec(reply.body);
        Ok(())
    }
}
