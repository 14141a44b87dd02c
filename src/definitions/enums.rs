//! # Core Enumerations
//!
//! Shared enumerated types for the proxy pool and the forwarding gateway.
//!
//! ## Main Components
//!
//! * **`ProxyProtocol`** - The wire protocol spoken by a proxy relay
//! * **`HttpMethod`** - HTTP verbs accepted by the forwarding endpoint
//! * **`ErrorKind`** - The classified taxonomy of forwarding failures
//!
//! All types serialize to their lowercase (or uppercase, for methods) wire
//! names so that API payloads match what clients send and receive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The protocol a proxy relay speaks.
///
/// HTTP/HTTPS proxies only relay web traffic; SOCKS proxies relay arbitrary
/// TCP streams. The lowercase form of each variant is the scheme used when
/// synthesizing a proxy URL.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::enums::ProxyProtocol;
/// use std::str::FromStr;
///
/// let protocol = ProxyProtocol::from_str("socks5").unwrap();
/// assert_eq!(protocol, ProxyProtocol::Socks5);
/// assert_eq!(protocol.scheme(), "socks5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    /// Plain HTTP proxying
    Http,

    /// HTTP proxying over an encrypted connection to the relay
    Https,

    /// SOCKS4 - TCP relaying without authentication
    Socks4,

    /// SOCKS5 - TCP relaying with optional authentication
    Socks5,
}

impl ProxyProtocol {
    /// Returns the URL scheme for this protocol.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

impl Default for ProxyProtocol {
    fn default() -> Self {
        ProxyProtocol::Http
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl std::str::FromStr for ProxyProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(ProxyProtocol::Http),
            "https" => Ok(ProxyProtocol::Https),
            "socks4" => Ok(ProxyProtocol::Socks4),
            "socks5" => Ok(ProxyProtocol::Socks5),
            _ => Err(format!("Unknown proxy protocol: {s}")),
        }
    }
}

/// HTTP methods accepted by the forwarding endpoint.
///
/// Serializes to the uppercase verb, matching the JSON request body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Converts to the `reqwest` method type.
    #[must_use]
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        f.write_str(verb)
    }
}

/// Classified failure taxonomy surfaced to forwarding clients.
///
/// Every low-level transport failure is mapped to one of these kinds before
/// being recorded; the gateway reports the kind of the last failure when a
/// forwarding call exhausts its retry budget.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::enums::ErrorKind;
///
/// assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
/// assert_eq!(ErrorKind::RetryStatus.to_string(), "retry_status");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request did not complete within its timeout
    Timeout,

    /// The TCP connection to the target could not be established
    ConnectionError,

    /// The relay itself refused or dropped the connection
    ProxyError,

    /// The response carried an error status surfaced by the HTTP layer
    HttpStatusError,

    /// The response status was in the caller-supplied retry set
    RetryStatus,

    /// Anything that does not fit the categories above
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::ProxyError => "proxy_error",
            ErrorKind::HttpStatusError => "http_status_error",
            ErrorKind::RetryStatus => "retry_status",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn protocol_round_trips_through_str() {
        for raw in ["http", "https", "socks4", "socks5"] {
            let parsed = ProxyProtocol::from_str(raw).unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
        assert!(ProxyProtocol::from_str("gopher").is_err());
    }

    #[test]
    fn protocol_parsing_ignores_case() {
        assert_eq!(ProxyProtocol::from_str("SOCKS5").unwrap(), ProxyProtocol::Socks5);
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Post).unwrap();
        assert_eq!(json, "\"POST\"");
        let back: HttpMethod = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(back, HttpMethod::Delete);
    }

    #[test]
    fn error_kind_wire_names() {
        assert_eq!(ErrorKind::ConnectionError.to_string(), "connection_error");
        assert_eq!(
            serde_json::to_string(&ErrorKind::HttpStatusError).unwrap(),
            "\"http_status_error\""
        );
    }
}
