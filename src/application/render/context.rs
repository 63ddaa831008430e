//! Per-request values injected into every render.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, request::Parts};

use tracing::warn;

/// Incoming request as seen by the platform under the `REQUEST` token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    original_url: String,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            original_url: original_url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Capture method, path-and-query and headers from an HTTP request.
    pub fn from_parts(parts: &Parts) -> Self {
        let original_url = parts
            .uri
            .path_and_query()
            .map(|value| value.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Self {
            method: parts.method.clone(),
            original_url,
            headers: parts.headers.clone(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[derive(Debug)]
struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
}

/// Shared handle the platform writes status and headers through while it
/// renders. Clones observe the same response.
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    head: Arc<Mutex<ResponseHead>>,
}

impl Default for ResponseHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self {
            head: Arc::new(Mutex::new(ResponseHead {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
            })),
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        self.head("set_status").status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.head("status").status
    }

    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.head("insert_header").headers.insert(name, value);
    }

    pub fn headers(&self) -> HeaderMap {
        self.head("headers").headers.clone()
    }

    /// A renderer that panics mid-write poisons the lock; whatever it wrote
    /// before panicking stays visible.
    fn head(&self, op: &'static str) -> MutexGuard<'_, ResponseHead> {
        self.head.lock().unwrap_or_else(|poisoned| {
            warn!(op, "response handle lock poisoned; keeping last written status and headers");
            poisoned.into_inner()
        })
    }
}

/// Document and URL for the render, provided under `INITIAL_CONFIG`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub document: Arc<str>,
    pub url: String,
}
