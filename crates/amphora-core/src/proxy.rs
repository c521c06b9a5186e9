//! Fetch proxy: outbound fetches on behalf of preload callbacks.
//!
//! Relative URLs resolve against the server's own origin; cookies and
//! the incoming `authorization` header are forwarded when the target is
//! same-origin or the caller explicitly asks for credentials.

use std::collections::BTreeMap;
use std::sync::Arc;

use url::Url;

use amphora_data::{FetchError, FetchOptions, FetchResponse, OutboundRequest, Transport, Credentials};

use crate::http::PageRequest;

/// Per-request fetch proxy.
///
/// Captures the credential material of one incoming request (cookies,
/// authorization, cookies already staged for the response) and applies
/// the forwarding rules to every outbound call.
pub struct FetchProxy {
    base: Url,
    cookie_header: String,
    authorization: Option<String>,
    staged_cookies: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl FetchProxy {
    /// Build the proxy for a request.
    ///
    /// `staged_cookies` are the `Set-Cookie` values already written to
    /// the response; they take the highest precedence when merging.
    pub fn new(
        req: &PageRequest,
        base_path: &str,
        port: u16,
        staged_cookies: Vec<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, FetchError> {
        let scheme = if req.encrypted { "https" } else { "http" };
        let prefix = if base_path.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", base_path.trim_end_matches('/'))
        };
        let base = Url::parse(&format!("{}://127.0.0.1:{}{}", scheme, port, prefix))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            base,
            cookie_header: req.header("cookie").unwrap_or_default().to_string(),
            authorization: req.header("authorization").map(|v| v.to_string()),
            staged_cookies,
            transport,
        })
    }

    /// Perform a proxied fetch.
    pub async fn fetch(
        &self,
        url: &str,
        opts: FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        let target = Url::options()
            .base_url(Some(&self.base))
            .parse(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let include_credentials = opts.credentials == Credentials::Include
            || (opts.credentials != Credentials::Omit && target.origin() == self.base.origin());

        let mut request = OutboundRequest::new(opts.method, target.to_string());
        request.headers = opts.headers.clone();
        request.body = opts.body.clone();

        if include_credentials {
            let cookie = merge_cookies(
                &self.cookie_header,
                opts.get_header("cookie"),
                &self.staged_cookies,
            );
            if !cookie.is_empty() {
                request.headers.retain(|k, _| k.to_lowercase() != "cookie");
                request.headers.insert("cookie".to_string(), cookie);
            }

            if request.header("authorization").is_none() {
                if let Some(authorization) = &self.authorization {
                    request
                        .headers
                        .insert("authorization".to_string(), authorization.clone());
                }
            }
        }

        self.transport.send(request).await
    }
}

/// Parse a `Cookie` header into name/value pairs.
fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Merge cookie sources by precedence (lowest to highest): incoming
/// request cookies, cookies on the call's own headers, cookies staged
/// for the outbound response. Later sources override by name.
fn merge_cookies(incoming: &str, call_header: Option<&str>, staged: &[String]) -> String {
    let mut cookies: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in parse_cookie_header(incoming) {
        cookies.insert(name, value);
    }
    if let Some(header) = call_header {
        for (name, value) in parse_cookie_header(header) {
            cookies.insert(name, value);
        }
    }
    for set_cookie in staged {
        // only the name=value pair matters, attributes are response-side
        if let Some((name, value)) = set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
        {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    cookies
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Transport that records the request and answers 200.
    struct Recording(Mutex<Option<OutboundRequest>>);

    impl Recording {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(None)))
        }

        fn last(&self) -> OutboundRequest {
            self.0.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl Transport for Recording {
        async fn send(&self, request: OutboundRequest) -> Result<FetchResponse, FetchError> {
            *self.0.lock().unwrap() = Some(request);
            Ok(FetchResponse::new(200, HashMap::new(), Vec::new()))
        }
    }

    fn proxy_for(req: &PageRequest, staged: Vec<String>) -> (FetchProxy, Arc<Recording>) {
        let transport = Recording::new();
        let proxy = FetchProxy::new(req, "", 3000, staged, transport.clone()).unwrap();
        (proxy, transport)
    }

    // === Cookie Merge Tests ===

    #[test]
    fn test_merge_cookies_precedence() {
        let merged = merge_cookies("a=1; b=2", Some("a=2"), &["a=3; Path=/".to_string()]);
        assert_eq!(merged, "a=3; b=2");
    }

    #[test]
    fn test_merge_cookies_staged_attributes_ignored() {
        let merged = merge_cookies("", None, &["sid=xyz; HttpOnly; Secure".to_string()]);
        assert_eq!(merged, "sid=xyz");
    }

    #[test]
    fn test_parse_cookie_header_skips_malformed() {
        let parsed = parse_cookie_header("a=1; garbage; b=2");
        assert_eq!(
            parsed,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    // === URL Resolution Tests ===

    #[tokio::test]
    async fn test_relative_url_resolves_against_own_origin() {
        let req = PageRequest::new("example.com", "/");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy.fetch("api/data", FetchOptions::new()).await.unwrap();
        assert_eq!(transport.last().url, "http://127.0.0.1:3000/api/data");
    }

    #[tokio::test]
    async fn test_relative_url_respects_base_path() {
        let req = PageRequest::new("example.com", "/");
        let transport = Recording::new();
        let proxy = FetchProxy::new(&req, "/amp", 3000, Vec::new(), transport.clone()).unwrap();

        proxy.fetch("api/data", FetchOptions::new()).await.unwrap();
        assert_eq!(transport.last().url, "http://127.0.0.1:3000/amp/api/data");
    }

    #[tokio::test]
    async fn test_encrypted_connection_uses_https() {
        let req = PageRequest::new("example.com", "/").with_encrypted(true);
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy.fetch("/api", FetchOptions::new()).await.unwrap();
        assert!(transport.last().url.starts_with("https://127.0.0.1:3000/"));
    }

    // === Credential Forwarding Tests ===

    #[tokio::test]
    async fn test_same_origin_forwards_cookies_by_default() {
        let req = PageRequest::new("example.com", "/").with_header("cookie", "sid=abc");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy.fetch("/api", FetchOptions::new()).await.unwrap();
        assert_eq!(transport.last().header("cookie"), Some("sid=abc"));
    }

    #[tokio::test]
    async fn test_cross_origin_omits_credentials_by_default() {
        let req = PageRequest::new("example.com", "/").with_header("cookie", "sid=abc");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy
            .fetch("https://api.example.com/data", FetchOptions::new())
            .await
            .unwrap();
        assert_eq!(transport.last().header("cookie"), None);
    }

    #[tokio::test]
    async fn test_include_forwards_cross_origin() {
        let req = PageRequest::new("example.com", "/").with_header("cookie", "sid=abc");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy
            .fetch(
                "https://api.example.com/data",
                FetchOptions::new().credentials(Credentials::Include),
            )
            .await
            .unwrap();
        assert_eq!(transport.last().header("cookie"), Some("sid=abc"));
    }

    #[tokio::test]
    async fn test_omit_strips_credentials_same_origin() {
        let req = PageRequest::new("example.com", "/")
            .with_header("cookie", "sid=abc")
            .with_header("authorization", "Bearer tok");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy
            .fetch("/api", FetchOptions::new().credentials(Credentials::Omit))
            .await
            .unwrap();
        let sent = transport.last();
        assert_eq!(sent.header("cookie"), None);
        assert_eq!(sent.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_staged_set_cookie_wins() {
        let req = PageRequest::new("example.com", "/").with_header("cookie", "a=1");
        let (proxy, transport) = proxy_for(&req, vec!["a=3; Path=/".to_string()]);

        proxy
            .fetch("/api", FetchOptions::new().header("cookie", "a=2"))
            .await
            .unwrap();
        assert_eq!(transport.last().header("cookie"), Some("a=3"));
    }

    #[tokio::test]
    async fn test_authorization_forwarded_unless_caller_set_one() {
        let req = PageRequest::new("example.com", "/").with_header("authorization", "Bearer inc");
        let (proxy, transport) = proxy_for(&req, Vec::new());

        proxy.fetch("/api", FetchOptions::new()).await.unwrap();
        assert_eq!(transport.last().header("authorization"), Some("Bearer inc"));

        proxy
            .fetch(
                "/api",
                FetchOptions::new().header("authorization", "Bearer own"),
            )
            .await
            .unwrap();
        assert_eq!(transport.last().header("authorization"), Some("Bearer own"));
    }
}
