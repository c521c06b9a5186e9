//! Outbound fetch responses.

use crate::FetchError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A response returned by the [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self.text().unwrap_or_else(|_| "Unknown error".to_string());
            Err(FetchError::HttpError {
                status: self.status,
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> FetchResponse {
        FetchResponse::new(status, HashMap::new(), body.to_vec())
    }

    // === Status Tests ===

    #[test]
    fn test_response_is_success() {
        assert!(make_response(200, b"").is_success());
        assert!(make_response(204, b"").is_success());
        assert!(!make_response(301, b"").is_success());
        assert!(!make_response(500, b"").is_success());
    }

    #[test]
    fn test_response_error_for_status() {
        assert!(make_response(200, b"ok").error_for_status().is_ok());
        assert!(make_response(404, b"missing").error_for_status().is_err());
    }

    // === Body Tests ===

    #[test]
    fn test_response_text() {
        let resp = make_response(200, b"Hello");
        assert_eq!(resp.text().unwrap(), "Hello");
    }

    #[test]
    fn test_response_json() {
        use serde::Deserialize;

        #[derive(Deserialize, Debug, PartialEq)]
        struct Data {
            title: String,
        }

        let resp = make_response(200, br#"{"title": "Hello"}"#);
        let data: Data = resp.json().unwrap();
        assert_eq!(data.title, "Hello");
    }

    #[test]
    fn test_response_json_invalid() {
        let resp = make_response(200, b"not json");
        let result: Result<serde_json::Value, _> = resp.json();
        assert!(result.is_err());
    }

    // === Header Tests ===

    #[test]
    fn test_response_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/html".to_string());
        let resp = FetchResponse::new(200, headers, Vec::new());
        assert_eq!(resp.header("content-type"), Some("text/html"));
    }
}
