//! # Validator Module
//!
//! Liveness probing for proxy candidates: a GET to the configured
//! verification URL through each candidate, with latency measurement and a
//! concurrency cap for batches.
//!
//! ## Overview
//!
//! A probe is deliberately blunt: HTTP 200 within the timeout means alive,
//! anything else means dead. The verification URL is an arbitrary public
//! endpoint, so TLS verification stays off and no conclusions are drawn
//! from the body. Batch validation runs probes under a semaphore and never
//! aborts on individual failures; completion order is unspecified.
//!
//! ## Examples
//!
//! ```no_run
//! use proxyforge::inspection::Validator;
//! use proxyforge::definitions::proxy::Proxy;
//! use proxyforge::definitions::enums::ProxyProtocol;
//!
//! #[tokio::main]
//! async fn main() {
//!     let validator = Validator::new("https://httpbin.org/ip", 10);
//!     let mut proxy = Proxy::new("203.0.113.9", 8080, ProxyProtocol::Http);
//!     validator.probe(&mut proxy).await;
//!     println!("valid: {}, speed: {:?}", proxy.is_valid, proxy.speed);
//! }
//! ```

use crate::config::Settings;
use crate::definitions::proxy::Proxy;
use crate::io::http::Requestor;
use crate::utils;
use futures::{StreamExt, stream};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Probes candidates through themselves against a verification URL.
#[derive(Clone)]
pub struct Validator {
    /// URL fetched through each candidate
    validation_url: String,

    /// Per-probe timeout
    timeout: Duration,
}

impl Validator {
    /// Creates a validator for the given verification URL and timeout.
    #[must_use]
    pub fn new(validation_url: impl Into<String>, timeout_secs: u64) -> Self {
        Validator {
            validation_url: validation_url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Creates a validator from the runtime settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Validator::new(
            settings.proxy_validation_url.clone(),
            settings.proxy_validation_timeout,
        )
    }

    /// Probes a single candidate, mutating it in place.
    ///
    /// On HTTP 200 the candidate becomes valid and `speed` records the
    /// probe latency; on any other status or failure it becomes invalid and
    /// the previous `speed` stays untouched. `last_checked` is always set.
    pub async fn probe(&self, proxy: &mut Proxy) {
        let started = Instant::now();

        let client = match Requestor::client_for(Some(proxy), self.timeout, true) {
            Ok(client) => client,
            Err(e) => {
                debug!("Probe setup failed for {}: {e}", proxy.proxy_url());
                proxy.record_probe_failure();
                return;
            }
        };

        let outcome = client
            .get(&self.validation_url)
            .header(
                reqwest::header::USER_AGENT,
                utils::get_random_user_agent(),
            )
            .send()
            .await;

        match outcome {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                let speed = started.elapsed().as_secs_f64();
                proxy.record_probe_success(speed);
                debug!("Probe ok: {} in {speed:.2}s", proxy.proxy_url());
            }
            Ok(response) => {
                proxy.record_probe_failure();
                debug!(
                    "Probe rejected: {} answered {}",
                    proxy.proxy_url(),
                    response.status()
                );
            }
            Err(e) => {
                proxy.record_probe_failure();
                debug!("Probe failed: {}: {e}", proxy.proxy_url());
            }
        }
    }

    /// Probes a batch in place with at most `concurrency` probes in flight.
    ///
    /// Individual failures never abort the batch. Callers must not depend
    /// on completion order.
    pub async fn validate(&self, proxies: &mut [Proxy], concurrency: usize) {
        if proxies.is_empty() {
            return;
        }

        let total = proxies.len();
        let width = concurrency.max(1);
        info!("Validating {total} proxies with concurrency {width}");

        let semaphore = Arc::new(Semaphore::new(width));

        let mut in_flight = stream::FuturesUnordered::new();
        for proxy in proxies.iter_mut() {
            while in_flight.len() >= width {
                in_flight.next().await;
            }
            let semaphore = Arc::clone(&semaphore);
            in_flight.push(async move {
                let _permit = semaphore.acquire().await.ok();
                self.probe(proxy).await;
            });
        }
        while in_flight.next().await.is_some() {}
        drop(in_flight);

        let mut by_source: HashMap<&str, usize> = HashMap::new();
        let mut valid = 0usize;
        for proxy in proxies.iter() {
            if proxy.is_valid {
                valid += 1;
                if let Some(source) = &proxy.source {
                    *by_source.entry(source.as_str()).or_insert(0) += 1;
                }
            }
        }

        let distribution = if by_source.is_empty() {
            "none".to_string()
        } else {
            by_source
                .iter()
                .map(|(source, count)| format!("{source}: {count}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        info!("Validation done, valid {valid}/{total}, by source: {distribution}");
    }

    /// Probes a batch and keeps only the candidates that came back alive.
    #[must_use]
    pub async fn get_valid(&self, mut proxies: Vec<Proxy>, concurrency: usize) -> Vec<Proxy> {
        self.validate(&mut proxies, concurrency).await;
        proxies.retain(|proxy| proxy.is_valid);
        proxies
    }
}
