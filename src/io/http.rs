//! # HTTP Module
//!
//! Outbound HTTP for the whole service: fetching listings, probing
//! candidates, and executing forwarded requests, with or without a proxy in
//! the path.
//!
//! ## Components
//!
//! * **Requestor** - Builds per-call clients and executes requests
//! * **Transport** - The narrow seam the forwarder drives, so retry logic
//!   can be exercised without a network
//!
//! ## Examples
//!
//! ```no_run
//! use proxyforge::io::http::Requestor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let requestor = Requestor::new();
//!     let body = requestor.get("https://example.com", "Mozilla/5.0").await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```

use crate::definitions::{
    defaults,
    errors::{RequestResult, RequestorError},
    proxy::Proxy,
    request::{ForwardResponse, RequestSpec},
};
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, redirect};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Executes outbound HTTP requests.
///
/// Clients are built per call: a forwarded request may need a different
/// proxy, timeout, and redirect policy every time, and reqwest clients are
/// cheap enough to assemble that caching them per proxy is not worth the
/// bookkeeping.
///
/// TLS verification is disabled on proxied paths; free relays routinely
/// man-in-the-middle the handshake and the service makes no integrity
/// promises about what passes through them.
#[derive(Clone)]
pub struct Requestor {
    /// Default timeout applied when a call does not carry its own
    timeout: Duration,
}

impl Default for Requestor {
    fn default() -> Self {
        Requestor::new()
    }
}

impl Requestor {
    /// Creates a requestor with the default request timeout.
    #[must_use]
    pub fn new() -> Self {
        Requestor::with_timeout(defaults::DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Creates a requestor with a custom default timeout in seconds.
    #[must_use]
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Requestor {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Builds a client, optionally routed through a proxy.
    ///
    /// # Errors
    ///
    /// Returns an error when the proxy URL is unusable or the client cannot
    /// be constructed.
    pub fn client_for(
        proxy: Option<&Proxy>,
        timeout: Duration,
        allow_redirects: bool,
    ) -> RequestResult<Client> {
        let policy = if allow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .timeout(timeout)
            .redirect(policy)
            .danger_accept_invalid_certs(true);

        if let Some(proxy) = proxy {
            let mut relay = ReqwestProxy::all(proxy.proxy_url())
                .map_err(|e| RequestorError::Proxy(e.to_string()))?;

            if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
                relay = relay.basic_auth(user, pass);
            }

            builder = builder.proxy(relay);
        }

        builder.build().map_err(RequestorError::Request)
    }

    /// Fetches a URL directly and returns the body text.
    ///
    /// Used for listing endpoints: a non-success status is an error here,
    /// unlike on the forwarding path where statuses belong to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, times out, or the server
    /// answers with a non-success status.
    pub async fn get(&self, url: &str, user_agent: &str) -> RequestResult<String> {
        let client = Requestor::client_for(None, self.timeout, true)?;

        let response = client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| classify(e, false, self.timeout.as_secs()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestorError::Status(status, status.to_string()));
        }

        response
            .text()
            .await
            .map_err(|e| classify(e, false, self.timeout.as_secs()))
    }

    /// Executes a forwarded request, optionally through a proxy.
    ///
    /// Construction contract: `method` + `url`, extra `headers`, `params` as
    /// query string, `json` body when present (beating `data`), otherwise
    /// `data` as a form body. The response is captured whole: status,
    /// flattened headers, text body, detected encoding, elapsed seconds, and
    /// the proxy URL actually used.
    ///
    /// Statuses are never turned into errors here; classifying a 503 as
    /// retryable or returnable is the forwarder's call.
    ///
    /// # Errors
    ///
    /// Returns a classified error when the exchange itself fails: timeout,
    /// connection failure, relay failure, or a malformed request.
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        proxy: Option<&Proxy>,
    ) -> RequestResult<ForwardResponse> {
        let timeout = Duration::from_secs(spec.timeout_or(self.timeout.as_secs()));
        let client = Requestor::client_for(proxy, timeout, spec.allow_redirects)?;

        let mut request = client.request(spec.method.as_reqwest(), spec.url.as_str());

        if let Some(headers) = &spec.headers {
            for (name, value) in headers {
                let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| RequestorError::Build(format!("header {name}: {e}")))?;
                let value = reqwest::header::HeaderValue::from_str(value)
                    .map_err(|e| RequestorError::Build(format!("header value: {e}")))?;
                request = request.header(name, value);
            }
        }

        if let Some(params) = &spec.params {
            request = request.query(params);
        }

        // JSON wins when both bodies are present.
        if let Some(json) = &spec.json {
            request = request.json(json);
        } else if let Some(data) = &spec.data {
            request = request.form(data);
        }

        let proxied = proxy.is_some();
        let started = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, proxied, timeout.as_secs()))?;

        let status_code = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let encoding = detect_encoding(&headers);

        let content = response
            .text()
            .await
            .map_err(|e| classify(e, proxied, timeout.as_secs()))?;

        Ok(ForwardResponse {
            status_code,
            headers,
            content,
            encoding,
            elapsed: started.elapsed().as_secs_f64(),
            proxy_used: proxy.map(Proxy::proxy_url),
        })
    }
}

/// The seam between the forwarder's retry logic and the network.
///
/// [`Requestor`] is the production implementation; tests drive the retry
/// machinery with scripted transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes one forwarded request attempt.
    async fn send(&self, spec: &RequestSpec, proxy: Option<&Proxy>)
    -> RequestResult<ForwardResponse>;
}

#[async_trait]
impl Transport for Requestor {
    async fn send(
        &self,
        spec: &RequestSpec,
        proxy: Option<&Proxy>,
    ) -> RequestResult<ForwardResponse> {
        self.execute(spec, proxy).await
    }
}

/// Maps a reqwest failure onto the classified taxonomy.
///
/// A connect failure counts as a relay failure when a proxy was in the
/// path; without one there is no relay to blame.
fn classify(error: reqwest::Error, proxied: bool, timeout_secs: u64) -> RequestorError {
    if error.is_timeout() {
        RequestorError::Timeout(timeout_secs)
    } else if error.is_connect() {
        if proxied {
            RequestorError::Proxy(error.to_string())
        } else {
            RequestorError::Connect(error.to_string())
        }
    } else if let Some(status) = error.status() {
        RequestorError::Status(status, error.to_string())
    } else {
        RequestorError::Request(error)
    }
}

/// Flattens a header map into `String -> String`, joining repeats with ", ".
fn flatten_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();

    for (name, value) in headers {
        let text = value.to_str().unwrap_or_default().to_string();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&text);
            })
            .or_insert(text);
    }

    flat
}

/// Pulls the charset out of a Content-Type header, if one is declared.
fn detect_encoding(headers: &HashMap<String, String>) -> Option<String> {
    let content_type = headers.get("content-type")?;

    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|charset| charset.trim_matches('"').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_detection() {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "text/html; charset=UTF-8".to_string(),
        );
        assert_eq!(detect_encoding(&headers), Some("utf-8".to_string()));

        headers.insert("content-type".to_string(), "application/json".to_string());
        assert_eq!(detect_encoding(&headers), None);
    }

    #[test]
    fn client_builds_with_and_without_proxy() {
        let proxy = Proxy::new("127.0.0.1", 8080, crate::definitions::enums::ProxyProtocol::Http);

        assert!(Requestor::client_for(None, Duration::from_secs(5), true).is_ok());
        assert!(Requestor::client_for(Some(&proxy), Duration::from_secs(5), false).is_ok());
    }

    #[tokio::test]
    async fn execute_classifies_refused_connection() {
        // Nothing listens on this port; the direct path reports a
        // connection error, not a relay error.
        let requestor = Requestor::with_timeout(2);
        let spec = RequestSpec::get("http://127.0.0.1:9/");

        match requestor.execute(&spec, None).await {
            Err(RequestorError::Connect(_) | RequestorError::Request(_)) => {}
            other => panic!("expected connection-shaped error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_blames_relay_when_proxied() {
        let requestor = Requestor::with_timeout(2);
        let spec = RequestSpec::get("http://example.test/");
        let dead_relay =
            Proxy::new("127.0.0.1", 9, crate::definitions::enums::ProxyProtocol::Http);

        match requestor.execute(&spec, Some(&dead_relay)).await {
            Err(RequestorError::Proxy(_) | RequestorError::Request(_)) => {}
            other => panic!("expected relay-shaped error, got {other:?}"),
        }
    }
}
