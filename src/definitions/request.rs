//! # Request & Response Models
//!
//! The JSON shapes exchanged with forwarding clients: the request
//! specification accepted by `POST /api/request`, the captured upstream
//! response, and the uniform API envelope every handler answers with.

use crate::definitions::{defaults, enums::HttpMethod};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_true() -> bool {
    true
}

/// A client-supplied request to forward through the pool.
///
/// `data` and `json` are mutually exclusive bodies; when both are present
/// the JSON body wins. The retry knobs are optional and fall back to the
/// configured defaults; `max_retries` is the legacy name for the proxy
/// switch budget and only applies while `max_proxy_switches` is unset.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::request::RequestSpec;
///
/// let spec: RequestSpec =
///     serde_json::from_str(r#"{"url": "https://httpbin.org/ip"}"#).unwrap();
/// assert_eq!(spec.method.to_string(), "GET");
/// assert!(spec.allow_redirects);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Target URL.
    pub url: String,

    /// HTTP verb; defaults to GET.
    #[serde(default)]
    pub method: HttpMethod,

    /// Extra request headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Query parameters appended to the URL.
    #[serde(default)]
    pub params: Option<HashMap<String, String>>,

    /// Form-encoded body.
    #[serde(default)]
    pub data: Option<HashMap<String, serde_json::Value>>,

    /// JSON body; takes precedence over `data`.
    #[serde(default)]
    pub json: Option<serde_json::Value>,

    /// Per-request timeout in seconds; falls back to the configured default.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Whether redirects are followed; defaults to true.
    #[serde(default = "default_true")]
    pub allow_redirects: bool,

    /// Legacy switch budget; honored only while `max_proxy_switches` is
    /// unset.
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Attempts on one proxy before switching.
    #[serde(default)]
    pub max_retries_per_proxy: Option<u32>,

    /// Proxies tried before the call gives up.
    #[serde(default)]
    pub max_proxy_switches: Option<u32>,

    /// Statuses that trigger a retry. Absent means statuses are returned
    /// as-is, even 5xx.
    #[serde(default)]
    pub retry_on_status_codes: Option<Vec<u16>>,
}

impl RequestSpec {
    /// A bare GET spec for the given URL, everything else defaulted.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        RequestSpec {
            url: url.into(),
            method: HttpMethod::Get,
            headers: None,
            params: None,
            data: None,
            json: None,
            timeout: None,
            allow_redirects: true,
            max_retries: None,
            max_retries_per_proxy: None,
            max_proxy_switches: None,
            retry_on_status_codes: None,
        }
    }

    /// Resolves the per-request timeout against the configured default.
    #[must_use]
    pub fn timeout_or(&self, default_secs: u64) -> u64 {
        self.timeout.unwrap_or(default_secs)
    }
}

/// The captured upstream response handed back to the forwarding client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardResponse {
    /// Upstream HTTP status.
    pub status_code: u16,

    /// Response headers flattened to a string map.
    pub headers: HashMap<String, String>,

    /// Response body decoded as text.
    pub content: String,

    /// Character encoding detected from the Content-Type header.
    pub encoding: Option<String>,

    /// Wall-clock seconds the upstream exchange took.
    pub elapsed: f64,

    /// URL of the proxy the request went through, or `None` for a direct
    /// send.
    pub proxy_used: Option<String>,
}

/// Uniform envelope for every gateway payload.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::request::ApiResponse;
///
/// let ok = ApiResponse::success("done", Some(1));
/// assert!(ok.success);
///
/// let nope: ApiResponse<()> = ApiResponse::failure("no such proxy");
/// assert!(!nope.success);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Human-readable outcome description.
    pub message: String,

    /// Operation payload, when there is one.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// An affirmative envelope.
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// A negative envelope with no payload.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Resolved retry budgets for one forwarding call.
///
/// Produced from a [`RequestSpec`] plus the configured defaults, applying
/// the legacy `max_retries` compatibility rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPlan {
    /// Outer budget: proxies tried before giving up.
    pub max_proxy_switches: u32,

    /// Inner budget: attempts on one proxy.
    pub max_retries_per_proxy: u32,

    /// Statuses that trigger a retry, if the client asked for any.
    pub retry_on_status: Option<Vec<u16>>,
}

impl RetryPlan {
    /// Resolves the plan for a request.
    ///
    /// Legacy rule: a client that sets `max_retries` while leaving
    /// `max_proxy_switches` untouched meant the switch budget.
    #[must_use]
    pub fn resolve(spec: &RequestSpec, default_switches: u32, default_retries: u32) -> Self {
        let max_proxy_switches = match (spec.max_proxy_switches, spec.max_retries) {
            (Some(switches), _) => switches,
            (None, Some(legacy)) => legacy,
            (None, None) => default_switches,
        };

        RetryPlan {
            max_proxy_switches,
            max_retries_per_proxy: spec.max_retries_per_proxy.unwrap_or(default_retries),
            retry_on_status: spec.retry_on_status_codes.clone(),
        }
    }

    /// Upper bound on proxied send attempts for this plan.
    #[must_use]
    pub fn attempt_budget(&self) -> u32 {
        self.max_proxy_switches * self.max_retries_per_proxy
    }

    /// Whether the given status should trigger a retry.
    #[must_use]
    pub fn retries_on(&self, status: u16) -> bool {
        self.retry_on_status
            .as_ref()
            .is_some_and(|set| set.contains(&status))
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        RetryPlan {
            max_proxy_switches: defaults::DEFAULT_MAX_PROXY_SWITCHES,
            max_retries_per_proxy: defaults::DEFAULT_MAX_RETRIES_PER_PROXY,
            retry_on_status: None,
        }
    }
}
