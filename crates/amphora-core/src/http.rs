//! Request and response views for the page pipeline.
//!
//! The pipeline is server-agnostic: the embedding HTTP server converts
//! its native request into a [`PageRequest`] and writes the returned
//! [`ResponseParts`] back out. Nothing here touches sockets.

use amphora_router::{Headers, QueryParams};

/// The per-request view the pipeline consumes.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Request host header value.
    pub host: String,
    /// Normalized request path (no query string).
    pub path: String,
    /// Parsed query parameters.
    pub query: QueryParams,
    /// Request headers, lowercase names.
    pub headers: Headers,
    /// Whether the underlying connection is TLS.
    pub encrypted: bool,
    /// Path prefix the handler is mounted under for this request, if the
    /// server supplies one; falls back to the configured base path.
    pub base_path: Option<String>,
    /// `Set-Cookie` values already staged for the response by earlier
    /// middleware.
    pub staged_cookies: Vec<String>,
    /// CSP nonce for inline style/script tags, if the response carries one.
    pub nonce: Option<String>,
}

impl PageRequest {
    /// Create a request view for the given host and path.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            query: QueryParams::new(),
            headers: Headers::new(),
            encrypted: false,
            base_path: None,
            staged_cookies: Vec::new(),
            nonce: None,
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a request header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Mark the connection as TLS.
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Set the per-request mount prefix.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into().trim_end_matches('/').to_string());
        self
    }

    /// Stage a `Set-Cookie` value for the response.
    pub fn with_staged_cookie(mut self, value: impl Into<String>) -> Self {
        self.staged_cookies.push(value.into());
        self
    }

    /// Set the CSP nonce.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Get a request header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }
}

/// The response the pipeline produces.
///
/// Headers are an ordered list rather than a map because `Set-Cookie`
/// legitimately repeats.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// HTTP status code.
    pub status: u16,
    headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParts {
    /// Create an empty 200 response.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Set a header, replacing any previous values of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value.into()));
    }

    /// Append a header without replacing existing values.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into().to_lowercase(), value.into()));
    }

    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header (case-insensitive).
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Response body as text, for diagnostics and tests.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
