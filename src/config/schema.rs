//! # Configuration Schema
//!
//! The typed runtime configuration of the service. Values come from the
//! environment (optionally seeded from a `.env` file); this module defines
//! the shape and the defaults, `loader` fills it in.

use crate::definitions::defaults;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the pool, the forwarder, and the gateway.
///
/// # Examples
///
/// ```
/// use proxyforge::config::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.port, 8000);
/// assert_eq!(settings.proxy_pool_size, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Interface the gateway binds to.
    pub host: String,

    /// Port the gateway listens on.
    pub port: u16,

    /// Debug mode: more verbose logging defaults.
    pub debug: bool,

    /// Target number of valid proxies in the pool.
    pub proxy_pool_size: usize,

    /// Seconds between background revalidation/refill cycles.
    pub proxy_update_interval: u64,

    /// Seconds a validation probe may take.
    pub proxy_validation_timeout: u64,

    /// URL probed through each candidate during validation.
    pub proxy_validation_url: String,

    /// Default timeout for forwarded requests, in seconds.
    pub request_timeout: u64,

    /// Legacy retry knob, kept for clients that still send it.
    pub request_max_retries: u32,

    /// Attempts on one proxy before switching.
    pub request_max_retries_per_proxy: u32,

    /// Proxies tried before a forwarding call gives up.
    pub request_max_proxy_switches: u32,

    /// Log filter (error, warn, info, debug, trace).
    pub log_level: String,

    /// Optional log file; logs go to stderr when unset.
    pub log_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            proxy_pool_size: defaults::DEFAULT_POOL_SIZE,
            proxy_update_interval: defaults::DEFAULT_UPDATE_INTERVAL_SECS,
            proxy_validation_timeout: defaults::DEFAULT_VALIDATION_TIMEOUT_SECS,
            proxy_validation_url: defaults::DEFAULT_VALIDATION_URL.to_string(),
            request_timeout: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
            request_max_retries: defaults::DEFAULT_LEGACY_MAX_RETRIES,
            request_max_retries_per_proxy: defaults::DEFAULT_MAX_RETRIES_PER_PROXY,
            request_max_proxy_switches: defaults::DEFAULT_MAX_PROXY_SWITCHES,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}
