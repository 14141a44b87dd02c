//! # Configuration Loader
//!
//! Fills a [`Settings`] from the process environment. Every field of the
//! schema maps to an uppercase variable of the same name (`proxy_pool_size`
//! ⇒ `PROXY_POOL_SIZE`); unset variables keep their defaults, malformed
//! values are reported instead of silently ignored.
//!
//! `.env` handling is the binary's job (dotenvy seeds the environment
//! before this loader runs), so library users and tests see plain
//! `std::env` semantics.

use crate::config::schema::Settings;
use crate::definitions::errors::{ConfigError, ConfigResult};
use std::env;
use std::str::FromStr;

/// Loads settings from the environment on top of the defaults.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a set variable fails to parse
/// into its field's type.
///
/// # Examples
///
/// ```
/// use proxyforge::config::loader;
///
/// let settings = loader::load().unwrap();
/// assert!(!settings.host.is_empty());
/// ```
pub fn load() -> ConfigResult<Settings> {
    let mut settings = Settings::default();

    if let Some(host) = string_var("HOST") {
        settings.host = host;
    }
    if let Some(port) = parsed_var::<u16>("PORT")? {
        settings.port = port;
    }
    if let Some(debug) = bool_var("DEBUG")? {
        settings.debug = debug;
    }
    if let Some(size) = parsed_var::<usize>("PROXY_POOL_SIZE")? {
        settings.proxy_pool_size = size;
    }
    if let Some(interval) = parsed_var::<u64>("PROXY_UPDATE_INTERVAL")? {
        settings.proxy_update_interval = interval;
    }
    if let Some(timeout) = parsed_var::<u64>("PROXY_VALIDATION_TIMEOUT")? {
        settings.proxy_validation_timeout = timeout;
    }
    if let Some(url) = string_var("PROXY_VALIDATION_URL") {
        settings.proxy_validation_url = url;
    }
    if let Some(timeout) = parsed_var::<u64>("REQUEST_TIMEOUT")? {
        settings.request_timeout = timeout;
    }
    if let Some(retries) = parsed_var::<u32>("REQUEST_MAX_RETRIES")? {
        settings.request_max_retries = retries;
    }
    if let Some(retries) = parsed_var::<u32>("REQUEST_MAX_RETRIES_PER_PROXY")? {
        settings.request_max_retries_per_proxy = retries;
    }
    if let Some(switches) = parsed_var::<u32>("REQUEST_MAX_PROXY_SWITCHES")? {
        settings.request_max_proxy_switches = switches;
    }
    if let Some(level) = string_var("LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(path) = string_var("LOG_FILE") {
        settings.log_file = Some(path);
    }

    Ok(settings)
}

fn string_var(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed_var<T: FromStr>(name: &'static str) -> ConfigResult<Option<T>> {
    match string_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

fn bool_var(name: &'static str) -> ConfigResult<Option<bool>> {
    match string_var(name) {
        None => Ok(None),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is process-global, so everything lives in one
    // test to avoid interleaving.
    #[test]
    fn environment_overrides_and_rejects() {
        unsafe {
            env::set_var("PROXY_POOL_SIZE", "25");
            env::set_var("PROXY_VALIDATION_URL", "http://probe.test/ip");
            env::set_var("DEBUG", "yes");
        }

        let settings = load().unwrap();
        assert_eq!(settings.proxy_pool_size, 25);
        assert_eq!(settings.proxy_validation_url, "http://probe.test/ip");
        assert!(settings.debug);
        // Untouched fields keep defaults.
        assert_eq!(settings.request_max_proxy_switches, 5);

        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        assert!(matches!(
            load(),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));

        unsafe {
            env::remove_var("PROXY_POOL_SIZE");
            env::remove_var("PROXY_VALIDATION_URL");
            env::remove_var("DEBUG");
            env::remove_var("PORT");
        }
    }
}
