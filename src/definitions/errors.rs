//! # Error Types
//!
//! Domain-specific error enums used throughout the proxyforge crate, each
//! with a matching `Result` alias for terser signatures.
//!
//! ## Overview
//!
//! - `RequestorError`: outbound HTTP failures, already split along the
//!   classified taxonomy (timeout / connect / proxy / status)
//! - `ProxyError`: proxy record validation failures
//! - `SourceError`: listing-source acquisition failures
//! - `ForwardError`: the aggregated failure of a forwarding call
//! - `ConfigError`: environment configuration failures
//! - `UtilError`: helpers (URL / regex validation)

use crate::definitions::enums::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised when executing outbound HTTP requests.
///
/// The variants mirror the classified taxonomy that the forwarder reports to
/// callers: a timeout, a refused connection, a relay failure, or an error
/// status. Everything else stays wrapped in the underlying `reqwest` error.
#[derive(Debug, Error)]
pub enum RequestorError {
    /// The request did not complete within the allotted time.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The TCP connection to the target could not be established.
    #[error("Connection error: {0}")]
    Connect(String),

    /// The relay refused, dropped, or mangled the connection.
    #[error("Proxy connection error: {0}")]
    Proxy(String),

    /// The server answered with a non-success status code.
    #[error("Server returned status code {0}: {1}")]
    Status(StatusCode, String),

    /// The request could not even be constructed (bad header, bad URL).
    #[error("Failed to build request: {0}")]
    Build(String),

    /// Any other failure from the underlying HTTP client.
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl RequestorError {
    /// Maps this error onto the classified taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestorError::Timeout(_) => ErrorKind::Timeout,
            RequestorError::Connect(_) => ErrorKind::ConnectionError,
            RequestorError::Proxy(_) => ErrorKind::ProxyError,
            RequestorError::Status(_, _) => ErrorKind::HttpStatusError,
            RequestorError::Build(_) | RequestorError::Request(_) => ErrorKind::Unknown,
        }
    }

    /// The HTTP status carried by this error, when there is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestorError::Status(code, _) => Some(code.as_u16()),
            _ => None,
        }
    }
}

/// Result type for outbound HTTP requests
pub type RequestResult<T> = Result<T, RequestorError>;

/// Errors raised when validating or constructing proxy records.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Port 0 is never routable.
    #[error("Invalid port number: {0}")]
    InvalidPort(u16),

    /// SOCKS5 credentials must come in pairs.
    #[error("Missing required authentication for proxy protocol")]
    MissingAuthentication,

    /// A proxy URL could not be parsed back into a record.
    #[error("Invalid proxy URL: {0}")]
    InvalidUrl(String),
}

/// Result type for proxy record operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors raised when fetching candidates from a listing source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The listing URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The extraction pattern did not compile.
    #[error("Invalid regex pattern: {0}")]
    InvalidRegexPattern(String),

    /// The listing endpoint could not be fetched.
    ///
    /// Rate limiting, network failures, and dead listings all land here.
    #[error("Failed to fetch from source: {0}")]
    FetchFailure(String),

    /// The listing responded with something the pattern could not chew.
    #[error("Failed to parse source response: {0}")]
    ParseError(String),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// The aggregated failure of a forwarding call.
///
/// Raised only after every proxy slot and retry has been consumed. Carries
/// the last observed error, its classified kind, the attempt tally, and the
/// last status code when one was seen. The display form keeps the
/// `请求失败` marker that existing clients match on.
#[derive(Debug)]
pub enum ForwardError {
    /// Every slot and retry failed.
    Exhausted {
        /// Number of proxy slots consumed (including empty ones).
        proxies_tried: u32,

        /// Total proxied send attempts.
        attempts: u32,

        /// Classified kind of the last failure.
        kind: ErrorKind,

        /// Text of the last failure.
        message: String,

        /// Last HTTP status observed, when the failure was status-driven.
        status: Option<u16>,
    },
}

impl std::error::Error for ForwardError {}

impl std::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ForwardError::Exhausted {
            proxies_tried,
            attempts,
            kind,
            message,
            status,
        } = self;
        write!(
            f,
            "请求失败 ({attempts} attempts across {proxies_tried} proxies): [{kind}] {message}"
        )?;
        if let Some(code) = status {
            write!(f, " (last status {code})")?;
        }
        Ok(())
    }
}

impl ForwardError {
    /// Total proxied send attempts behind this failure.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            ForwardError::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Classified kind of the last failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForwardError::Exhausted { kind, .. } => *kind,
        }
    }
}

/// Result type for forwarding calls
pub type ForwardResult<T> = Result<T, ForwardError>;

/// Errors raised while assembling the runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that failed to parse.
    #[error("Invalid configuration value for {name}: {value}")]
    InvalidValue {
        /// Variable name as looked up in the environment.
        name: &'static str,
        /// The offending raw value.
        value: String,
    },

    /// An I/O failure while reading `.env` or creating the log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error types for utility functions
#[derive(Debug, Error)]
pub enum UtilError {
    /// A URL does not follow RFC 3986 or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A regex pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

/// Result type for utility functions
pub type UtilResult<T> = Result<T, UtilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requestor_error_kinds() {
        assert_eq!(RequestorError::Timeout(10).kind(), ErrorKind::Timeout);
        assert_eq!(
            RequestorError::Connect("refused".into()).kind(),
            ErrorKind::ConnectionError
        );
        assert_eq!(
            RequestorError::Proxy("relay down".into()).kind(),
            ErrorKind::ProxyError
        );
        let status = RequestorError::Status(StatusCode::BAD_GATEWAY, "bad gateway".into());
        assert_eq!(status.kind(), ErrorKind::HttpStatusError);
        assert_eq!(status.status(), Some(502));
    }

    #[test]
    fn exhausted_display_carries_marker_and_counts() {
        let err = ForwardError::Exhausted {
            proxies_tried: 2,
            attempts: 4,
            kind: ErrorKind::RetryStatus,
            message: "HTTP 503".into(),
            status: Some(503),
        };
        let text = err.to_string();
        assert!(text.contains("请求失败"));
        assert!(text.contains("4 attempts"));
        assert!(text.contains("retry_status"));
        assert!(text.contains("503"));
    }
}
