//! Request and response value types shared by the filter chain and the
//! resource dispatcher.
//!
//! Filters and handlers execute on the request's own call stack, so these
//! types carry no synchronization of their own. Header and parameter storage
//! is stack-allocated for the common case.

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated header storage. Header names use `Arc<str>` because they
/// repeat across requests (Content-Type, Accept, ...); values are per-request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Stack-allocated path/query parameter storage.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// An inbound request as seen by filters and resources.
///
/// The body is kept as raw bytes; deserialization is owned by the
/// negotiation engine's providers, never by the transport.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method (GET, POST, ...)
    pub method: Method,
    /// Request path as matched by the external router
    pub path: String,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Path parameters extracted by the external router
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// Raw request body, if any
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request with no headers, parameters, or body.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            body: None,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when duplicate names exist at
    /// different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name ("last write wins" for duplicates).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `Content-Type` header with any `;`-delimited parameters stripped.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
            .map(|v| v.split(';').next().unwrap_or("").trim())
    }

    /// The raw `Accept` header, if present.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.get_header("accept")
    }
}

/// The response sink handed down the filter chain.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code (200, 404, 500, ...)
    pub status: u16,
    /// Response headers
    pub headers: HeaderVec,
    /// Raw response body
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Create an empty 200 response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Replace status and body with a JSON payload.
    pub fn set_json(&mut self, status: u16, body: &Value) {
        self.status = status;
        self.set_header("content-type", "application/json".to_string());
        // Value serialization cannot fail for tree-shaped data
        self.body = serde_json::to_vec(body).unwrap_or_default();
    }

    /// Replace status and body with a `{"error": message}` JSON payload.
    pub fn set_json_error(&mut self, status: u16, message: &str) {
        self.set_json(status, &serde_json::json!({ "error": message }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut req = Request::new(Method::GET, "/pets");
        req.set_header("Content-Type", "application/json; charset=utf-8".to_string());
        assert_eq!(
            req.get_header("content-type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(req.content_type(), Some("application/json"));
    }

    #[test]
    fn param_lookup_is_last_write_wins() {
        let mut req = Request::new(Method::GET, "/org/1/user/2");
        req.path_params.push((Arc::from("id"), "1".to_string()));
        req.path_params.push((Arc::from("id"), "2".to_string()));
        assert_eq!(req.get_path_param("id"), Some("2"));
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut res = Response::new();
        res.set_header("X-Token", "a".to_string());
        res.set_header("x-token", "b".to_string());
        assert_eq!(res.get_header("X-Token"), Some("b"));
        assert_eq!(res.headers.len(), 1);
    }
}
