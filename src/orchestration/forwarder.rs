//! # Forwarder Module
//!
//! Two-level retry around forwarded requests: an inner loop that re-sends
//! through the same proxy, and an outer loop that switches proxies when one
//! is exhausted.
//!
//! ## Overview
//!
//! Each forwarding call runs through up to `max_proxy_switches` slots. A
//! slot picks one proxy and spends up to `max_retries_per_proxy` attempts
//! on it; only when the slot's attempts are all gone is the proxy marked
//! invalid and the next slot opened. When no proxy is available, a slot
//! falls back to a single direct send. Statuses are returned as-is unless
//! the caller supplied a retry set; transport failures are recorded under
//! the classified taxonomy, and only the last failure is reported when the
//! whole call exhausts.
//!
//! Within one call the attempts are strictly sequential; concurrency exists
//! only across calls.

use crate::config::Settings;
use crate::definitions::{
    enums::ErrorKind,
    errors::{ForwardError, ForwardResult},
    proxy::Proxy,
    request::{ForwardResponse, RequestSpec, RetryPlan},
};
use crate::io::http::Transport;
use crate::orchestration::pool::ProxyPool;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

/// Supplies proxies to forwarding calls and takes failure feedback.
///
/// The pool is the production implementation: it hands out its fastest
/// valid proxy and flips `is_valid` off when a forwarding call reports a
/// relay as dead.
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Picks a proxy for the next slot, or `None` when the pool is dry.
    async fn pick_proxy(&self) -> Option<Proxy>;

    /// Records that a proxy failed out of its slot.
    async fn mark_invalid(&self, id: &str);
}

#[async_trait]
impl ProxyProvider for ProxyPool {
    async fn pick_proxy(&self) -> Option<Proxy> {
        self.get_fastest_proxy().await
    }

    async fn mark_invalid(&self, id: &str) {
        self.mark_proxy_invalid(id).await;
    }
}

/// Executes forwarded requests with retry and proxy switching.
pub struct Forwarder {
    /// The network seam; [`crate::io::http::Requestor`] in production.
    transport: Arc<dyn Transport>,

    /// Configured default for the outer switch budget.
    default_switches: u32,

    /// Configured default for the inner retry budget.
    default_retries: u32,

    /// Configured default timeout, applied when a spec carries none.
    default_timeout_secs: u64,
}

impl Forwarder {
    /// Creates a forwarder over the given transport and configured budgets.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        Forwarder {
            transport,
            default_switches: settings.request_max_proxy_switches,
            default_retries: settings.request_max_retries_per_proxy,
            default_timeout_secs: settings.request_timeout,
        }
    }

    /// Forwards one request, rotating proxies on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::Exhausted`] when every slot and retry has
    /// been consumed without a returnable response. The error carries the
    /// last failure's kind and text, the attempt tally, and the last status
    /// code when one was observed.
    pub async fn forward(
        &self,
        spec: &RequestSpec,
        provider: &dyn ProxyProvider,
    ) -> ForwardResult<ForwardResponse> {
        let plan = RetryPlan::resolve(spec, self.default_switches, self.default_retries);
        let timeout = spec.timeout_or(self.default_timeout_secs);

        info!(
            "Forwarding {} {} (budget: {} proxies x {} retries, timeout {timeout}s)",
            spec.method,
            spec.url,
            plan.max_proxy_switches,
            plan.max_retries_per_proxy
        );

        let mut last_kind = ErrorKind::Unknown;
        let mut last_message = String::from("no send attempt was made");
        let mut last_status: Option<u16> = None;
        let mut total_attempts: u32 = 0;

        for slot in 1..=plan.max_proxy_switches {
            let Some(proxy) = provider.pick_proxy().await else {
                warn!(
                    "Slot {slot}/{}: pool is dry, attempting direct send",
                    plan.max_proxy_switches
                );
                match self.transport.send(spec, None).await {
                    Ok(response) => {
                        info!("Direct send succeeded for {}", spec.url);
                        return Ok(response);
                    }
                    Err(e) => {
                        last_kind = e.kind();
                        last_status = e.status().or(last_status);
                        last_message = format!("direct send failed: {e}");
                        continue;
                    }
                }
            };

            let proxy_url = proxy.proxy_url();
            info!("Slot {slot}/{}: using {proxy_url}", plan.max_proxy_switches);

            let mut proxy_failed = false;
            for retry in 1..=plan.max_retries_per_proxy {
                total_attempts += 1;

                match self.transport.send(spec, Some(&proxy)).await {
                    Ok(response) => {
                        if plan.retries_on(response.status_code) {
                            last_kind = ErrorKind::RetryStatus;
                            last_status = Some(response.status_code);
                            last_message = format!("HTTP {}", response.status_code);
                            warn!(
                                "Slot {slot} retry {retry}/{}: status {} is in the retry set",
                                plan.max_retries_per_proxy, response.status_code
                            );
                            if retry == plan.max_retries_per_proxy {
                                proxy_failed = true;
                            }
                            continue;
                        }

                        info!(
                            "Forwarded {} in {total_attempts} attempt(s) via {proxy_url} ({})",
                            spec.url, response.status_code
                        );
                        return Ok(response);
                    }
                    Err(e) => {
                        last_kind = e.kind();
                        last_status = e.status().or(last_status);
                        last_message = e.to_string();
                        warn!(
                            "Slot {slot} retry {retry}/{} [{}]: {e}",
                            plan.max_retries_per_proxy,
                            e.kind()
                        );
                        if retry == plan.max_retries_per_proxy {
                            proxy_failed = true;
                        }
                    }
                }
            }

            if proxy_failed {
                if let Some(id) = &proxy.id {
                    provider.mark_invalid(id).await;
                    info!("Slot {slot}: {proxy_url} exhausted its retries, marked invalid");
                }
            }
        }

        warn!(
            "Forwarding {} exhausted: {total_attempts} attempts across {} proxies, last [{last_kind}] {last_message}",
            spec.url, plan.max_proxy_switches
        );

        Err(ForwardError::Exhausted {
            proxies_tried: plan.max_proxy_switches,
            attempts: total_attempts,
            kind: last_kind,
            message: last_message,
            status: last_status,
        })
    }
}
