//! # Pool Module
//!
//! The live set of admitted proxies and the control loops that keep it
//! stocked: replenishment, periodic revalidation, threshold-triggered
//! refill, selection, and stats.
//!
//! ## Overview
//!
//! The pool owns an `id → Proxy` map behind an async `RwLock`. Writers are
//! the maintenance operations (replenish, revalidate, cleanup, removal);
//! readers are the selection and snapshot calls the gateway serves from.
//! Replenishment rounds are serialized by a mutex, and the
//! threshold-triggered refill funnels through a `Notify` so concurrent
//! triggers coalesce into a single run instead of dog-piling.
//!
//! ## Lifecycle
//!
//! `start` acquires a small quick-start cohort so the service can answer
//! immediately, then hands off to the background loop: top up to the full
//! pool size, and on every interval re-probe everything (giving marked
//! proxies a chance to recover) before refilling. `stop` cancels the loops;
//! in-flight work is dropped and cannot resurrect a stopped pool.

use crate::config::Settings;
use crate::definitions::{defaults, proxy::Proxy};
use crate::inspection::Validator;
use crate::orchestration::{fetcher::Fetcher, threading::TaskManager};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use uuid::Uuid;

/// Aggregate counters for the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    /// Every entry, valid or not.
    pub total_proxies: usize,

    /// Entries whose latest probe or use succeeded.
    pub valid_proxies: usize,

    /// Entries awaiting cleanup or revival.
    pub invalid_proxies: usize,

    /// When the last replenishment finished.
    pub last_update: Option<DateTime<Utc>>,

    /// Mean probe latency over valid entries with a known speed.
    pub avg_speed: Option<f64>,
}

/// The self-replenishing set of validated proxies.
///
/// Constructed once at service start and shared behind an `Arc`; the
/// gateway, the forwarder, and the background loops all talk to the same
/// instance.
pub struct ProxyPool {
    /// Admitted proxies keyed by id.
    proxies: RwLock<AHashMap<String, Proxy>>,

    /// Candidate supply.
    fetcher: Fetcher,

    /// Liveness probing.
    validator: Validator,

    /// Target number of valid proxies.
    pool_size: usize,

    /// Pause between background revalidation cycles.
    update_interval: Duration,

    /// Valid-count floor under which selection requests a refill.
    refill_threshold: usize,

    /// In-flight probe cap for batches.
    validation_concurrency: usize,

    /// When the last replenishment finished.
    last_update: RwLock<Option<DateTime<Utc>>>,

    /// Serializes replenishment rounds.
    update_guard: Mutex<()>,

    /// Coalescing trigger for threshold refills.
    refill_notify: Notify,

    /// Set once on shutdown; maintenance paths bail out when raised.
    stopped: AtomicBool,

    /// Background loop handles.
    tasks: std::sync::Mutex<TaskManager>,
}

impl ProxyPool {
    /// Creates a stopped pool wired to the given supply and validator.
    #[must_use]
    pub fn new(settings: &Settings, fetcher: Fetcher, validator: Validator) -> Self {
        ProxyPool {
            proxies: RwLock::new(AHashMap::new()),
            fetcher,
            validator,
            pool_size: settings.proxy_pool_size,
            update_interval: Duration::from_secs(settings.proxy_update_interval),
            refill_threshold: settings.proxy_pool_size / 2,
            validation_concurrency: defaults::DEFAULT_PARALLEL_VALIDATIONS,
            last_update: RwLock::new(None),
            update_guard: Mutex::new(()),
            refill_notify: Notify::new(),
            stopped: AtomicBool::new(false),
            tasks: std::sync::Mutex::new(TaskManager::new()),
        }
    }

    /// Starts the pool: quick-start cohort first, background loops after.
    ///
    /// The quick-start round aims for a handful of working proxies in a
    /// single fetch-and-validate pass so the service can begin answering;
    /// the background loop then tops up to the full target and settles into
    /// the periodic revalidate-and-refill cycle.
    pub async fn start(self: Arc<Self>) {
        info!(
            "Starting proxy pool (target {}, quick-start {})",
            self.pool_size,
            defaults::QUICK_START_TARGET
        );

        self.update_pool_with(
            defaults::QUICK_START_TARGET,
            1,
            defaults::FETCH_MULTIPLIER,
        )
        .await;

        let background = Arc::clone(&self);
        let refill = Arc::clone(&self);

        let mut tasks = self.tasks.lock().expect("task manager lock poisoned");
        tasks.spawn(async move {
            background.background_loop().await;
        });
        tasks.spawn(async move {
            refill.refill_listener().await;
        });
    }

    /// Stops the background loops. In-flight maintenance is dropped.
    pub async fn stop(&self) {
        info!("Stopping proxy pool");
        self.stopped.store(true, Ordering::SeqCst);
        self.refill_notify.notify_one();
        self.tasks
            .lock()
            .expect("task manager lock poisoned")
            .cancel_all();
    }

    async fn background_loop(&self) {
        tokio::time::sleep(Duration::from_secs(defaults::STARTUP_GRACE_SECS)).await;
        info!("Background top-up to {} proxies", self.pool_size);
        self.update_pool().await;

        loop {
            tokio::time::sleep(self.update_interval).await;
            if self.is_stopped() {
                break;
            }
            info!("Periodic cycle: revalidating pool");
            self.validate_pool().await;
            self.update_pool().await;
        }
    }

    async fn refill_listener(&self) {
        loop {
            self.refill_notify.notified().await;
            if self.is_stopped() {
                break;
            }
            info!("Threshold refill running");
            self.update_pool().await;
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Replenishes to the configured pool size with default round limits.
    pub async fn update_pool(&self) {
        self.update_pool_with(
            self.pool_size,
            defaults::MAX_UPDATE_ATTEMPTS,
            defaults::FETCH_MULTIPLIER,
        )
        .await;
    }

    /// Replenishes the pool toward `target` valid proxies.
    ///
    /// Cleans out invalid entries, computes the shortfall, then runs up to
    /// `max_attempts` fetch-validate-admit rounds, over-fetching by
    /// `fetch_multiplier` to compensate for the low yield of free listings.
    /// Rounds stop early once the target is met. A final cleanup runs and
    /// `last_update` is stamped whether or not the target was reached.
    ///
    /// Rounds are serialized: concurrent callers queue behind the update
    /// guard and each sees the map state its predecessor left.
    pub async fn update_pool_with(
        &self,
        target: usize,
        max_attempts: usize,
        fetch_multiplier: usize,
    ) {
        if self.is_stopped() {
            return;
        }

        let _guard = self.update_guard.lock().await;

        self.cleanup_invalid().await;

        let mut current_valid = self.valid_count().await;
        let needed = target.saturating_sub(current_valid);
        if needed == 0 {
            info!("Pool already at target ({current_valid}/{target})");
            return;
        }

        info!("Replenishing: {current_valid}/{target} valid, need {needed}");
        let mut fetch_count = needed * fetch_multiplier;

        for attempt in 1..=max_attempts {
            info!("Round {attempt}/{max_attempts}: fetching {fetch_count} candidates");

            let candidates = self.fetcher.fetch(fetch_count).await;
            if candidates.is_empty() {
                warn!("Round {attempt} yielded no candidates");
                continue;
            }

            let valid = self
                .validator
                .get_valid(candidates, self.validation_concurrency)
                .await;
            let added = self.admit(valid).await;
            info!("Round {attempt} admitted {added} proxies");

            current_valid = self.valid_count().await;
            if current_valid >= target {
                break;
            }
            fetch_count = (target - current_valid) * fetch_multiplier;
        }

        self.cleanup_invalid().await;
        *self.last_update.write().await = Some(Utc::now());

        let final_valid = self.valid_count().await;
        info!("Replenishment done: {final_valid}/{target} valid");
        if final_valid < target {
            warn!(
                "Pool below target ({final_valid}/{target}); free listings are thin right now"
            );
        }
    }

    /// Assigns ids and inserts validated proxies, deduplicating by URL
    /// against current membership. Returns how many were inserted.
    pub(crate) async fn admit(&self, proxies: Vec<Proxy>) -> usize {
        let mut map = self.proxies.write().await;
        let mut member_urls: ahash::AHashSet<String> =
            map.values().map(Proxy::proxy_url).collect();

        let mut added = 0;
        for mut proxy in proxies {
            let url = proxy.proxy_url();
            if !member_urls.insert(url) {
                continue;
            }
            let id = Uuid::new_v4().to_string();
            proxy.id = Some(id.clone());
            if proxy.last_checked.is_none() {
                proxy.last_checked = Some(Utc::now());
            }
            map.insert(id, proxy);
            added += 1;
        }

        added
    }

    /// Re-probes every entry, including currently-invalid ones.
    ///
    /// This is the only path on which a marked-invalid proxy can come back:
    /// cleanup has not evicted it yet and the probe succeeds.
    pub async fn validate_pool(&self) {
        let mut snapshot: Vec<Proxy> = {
            let map = self.proxies.read().await;
            map.values().cloned().collect()
        };

        if snapshot.is_empty() {
            info!("Pool empty, skipping revalidation");
            return;
        }

        info!("Revalidating {} pool entries", snapshot.len());
        self.validator
            .validate(&mut snapshot, self.validation_concurrency)
            .await;

        let mut map = self.proxies.write().await;
        for proxy in snapshot {
            if let Some(id) = proxy.id.clone() {
                // An entry removed mid-probe stays removed.
                if let Some(slot) = map.get_mut(&id) {
                    *slot = proxy;
                }
            }
        }
    }

    /// Evicts every invalid entry. Returns how many were removed.
    pub(crate) async fn cleanup_invalid(&self) -> usize {
        let mut map = self.proxies.write().await;
        let invalid_ids: Vec<String> = map
            .iter()
            .filter(|(_, proxy)| !proxy.is_valid)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &invalid_ids {
            map.remove(id);
        }

        if !invalid_ids.is_empty() {
            info!("Cleaned up {} invalid proxies", invalid_ids.len());
        }
        invalid_ids.len()
    }

    /// The fastest valid proxy, or `None` when the pool has none.
    ///
    /// "Fastest" is the smallest recorded probe latency; unmeasured proxies
    /// sort last. Dropping under the refill threshold requests a background
    /// replenishment without blocking the caller.
    pub async fn get_fastest_proxy(&self) -> Option<Proxy> {
        let (choice, valid_count) = {
            let map = self.proxies.read().await;
            let valid: Vec<&Proxy> = map.values().filter(|p| p.is_valid).collect();
            let choice = valid
                .iter()
                .min_by(|a, b| {
                    a.speed_or_sentinel()
                        .partial_cmp(&b.speed_or_sentinel())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|p| (*p).clone());
            (choice, valid.len())
        };

        self.request_refill_if_low(valid_count);

        if choice.is_none() {
            warn!("No valid proxies available");
        }
        choice
    }

    /// A uniformly random valid proxy, for callers that fan out rather than
    /// ride the single fastest relay.
    pub async fn get_random_valid_proxy(&self) -> Option<Proxy> {
        let (choice, valid_count) = {
            let map = self.proxies.read().await;
            let valid: Vec<&Proxy> = map.values().filter(|p| p.is_valid).collect();
            let mut rng = rand::rng();
            let choice = valid.choose(&mut rng).map(|p| (*p).clone());
            (choice, valid.len())
        };

        self.request_refill_if_low(valid_count);
        choice
    }

    fn request_refill_if_low(&self, valid_count: usize) {
        if valid_count < self.refill_threshold && !self.is_stopped() {
            debug!(
                "Valid count {valid_count} under threshold {}; requesting refill",
                self.refill_threshold
            );
            // Coalesces: the listener runs one replenishment no matter how
            // many selections trip the threshold meanwhile.
            self.refill_notify.notify_one();
        }
    }

    /// Snapshot of every entry.
    pub async fn get_all_proxies(&self) -> Vec<Proxy> {
        self.proxies.read().await.values().cloned().collect()
    }

    /// Snapshot of the valid entries.
    pub async fn get_valid_proxies(&self) -> Vec<Proxy> {
        self.proxies
            .read()
            .await
            .values()
            .filter(|p| p.is_valid)
            .cloned()
            .collect()
    }

    /// Number of valid entries.
    pub async fn valid_count(&self) -> usize {
        self.proxies
            .read()
            .await
            .values()
            .filter(|p| p.is_valid)
            .count()
    }

    /// Deletes an entry. Returns whether it existed.
    pub async fn remove_proxy(&self, id: &str) -> bool {
        let removed = self.proxies.write().await.remove(id).is_some();
        if removed {
            info!("Removed proxy {id}");
        }
        removed
    }

    /// Marks an entry invalid, leaving it visible until the next cleanup so
    /// the periodic revalidation has a chance to revive it. Returns whether
    /// the id was known.
    pub async fn mark_proxy_invalid(&self, id: &str) -> bool {
        let mut map = self.proxies.write().await;
        match map.get_mut(id) {
            Some(proxy) => {
                proxy.is_valid = false;
                info!("Marked proxy {id} invalid");
                true
            }
            None => false,
        }
    }

    /// Aggregate counters.
    pub async fn get_stats(&self) -> PoolStats {
        let map = self.proxies.read().await;
        let total = map.len();
        let valid: Vec<&Proxy> = map.values().filter(|p| p.is_valid).collect();

        let speeds: Vec<f64> = valid.iter().filter_map(|p| p.speed).collect();
        let avg_speed = if speeds.is_empty() {
            None
        } else {
            Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
        };

        PoolStats {
            total_proxies: total,
            valid_proxies: valid.len(),
            invalid_proxies: total - valid.len(),
            last_update: *self.last_update.read().await,
            avg_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::enums::ProxyProtocol;
    use crate::definitions::source::{ProxySource, SourceRegistry};
    use crate::io::http::Requestor;
    use crate::testutil::{RELAY_OK, StaticSource, dead_addr, relay_proxy, spawn_stub_relay};

    fn test_settings(pool_size: usize) -> Settings {
        Settings {
            proxy_pool_size: pool_size,
            proxy_validation_url: "http://probe.invalid/ip".to_string(),
            proxy_validation_timeout: 2,
            ..Settings::default()
        }
    }

    fn pool_over(sources: Vec<Arc<dyn ProxySource>>, settings: &Settings) -> Arc<ProxyPool> {
        let fetcher = Fetcher::new(Arc::new(SourceRegistry::new(sources)), Requestor::new());
        let validator = Validator::from_settings(settings);
        Arc::new(ProxyPool::new(settings, fetcher, validator))
    }

    /// Spawns `n` independent live relays and returns their candidates.
    async fn live_candidates(n: usize) -> Vec<Proxy> {
        let mut proxies = Vec::new();
        for _ in 0..n {
            proxies.push(relay_proxy(spawn_stub_relay(RELAY_OK).await));
        }
        proxies
    }

    #[tokio::test]
    async fn update_pool_admits_validated_candidates() {
        let candidates = live_candidates(3).await;
        let source = Arc::new(StaticSource::new("live", candidates));
        let settings = test_settings(3);
        let pool = pool_over(vec![source], &settings);

        pool.update_pool_with(3, 3, 5).await;

        let stats = pool.get_stats().await;
        assert_eq!(stats.valid_proxies, 3);
        assert_eq!(stats.invalid_proxies, 0);
        assert!(stats.last_update.is_some());
        assert!(stats.avg_speed.is_some());

        let members = pool.get_all_proxies().await;
        assert!(members.iter().all(|p| p.id.is_some()));
        assert!(members.iter().all(|p| p.speed.is_some()));
    }

    #[tokio::test]
    async fn update_pool_twice_is_a_noop_second_time() {
        let candidates = live_candidates(2).await;
        let source = Arc::new(StaticSource::new("live", candidates));
        let handle = Arc::clone(&source);
        let settings = test_settings(2);
        let pool = pool_over(vec![source], &settings);

        pool.update_pool_with(2, 3, 5).await;
        let after_first = handle.call_count();
        assert!(after_first >= 1);
        let ids_first: Vec<String> = pool
            .get_all_proxies()
            .await
            .into_iter()
            .filter_map(|p| p.id)
            .collect();

        pool.update_pool_with(2, 3, 5).await;
        // Target already met: no fetch happened and membership is unchanged.
        assert_eq!(handle.call_count(), after_first);
        let ids_second: Vec<String> = pool
            .get_all_proxies()
            .await
            .into_iter()
            .filter_map(|p| p.id)
            .collect();
        let mut a = ids_first;
        let mut b = ids_second;
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn update_pool_survives_total_listing_failure() {
        let settings = test_settings(5);
        let pool = pool_over(
            vec![
                Arc::new(StaticSource::failing("a")),
                Arc::new(StaticSource::failing("b")),
            ],
            &settings,
        );

        pool.update_pool_with(5, 2, 5).await;

        let stats = pool.get_stats().await;
        assert_eq!(stats.total_proxies, 0);
        assert!(stats.last_update.is_some());
    }

    #[tokio::test]
    async fn dead_candidates_never_join_the_pool() {
        let dead = relay_proxy(dead_addr().await);
        let source = Arc::new(StaticSource::new("dead", vec![dead]));
        let settings = test_settings(2);
        let pool = pool_over(vec![source], &settings);

        pool.update_pool_with(2, 1, 5).await;

        assert_eq!(pool.get_stats().await.total_proxies, 0);
    }

    #[tokio::test]
    async fn admission_deduplicates_by_url() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        let proxy = Proxy::new("10.0.0.1", 80, ProxyProtocol::Http);
        assert_eq!(pool.admit(vec![proxy.clone(), proxy.clone()]).await, 1);
        assert_eq!(pool.admit(vec![proxy]).await, 0);
        assert_eq!(pool.get_stats().await.total_proxies, 1);
    }

    #[tokio::test]
    async fn fastest_selection_prefers_smallest_speed() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        let mut entries = Vec::new();
        for (host, speed) in [
            ("10.0.0.1", Some(0.5)),
            ("10.0.0.2", Some(0.1)),
            ("10.0.0.3", Some(0.8)),
            ("10.0.0.4", None),
        ] {
            let mut proxy = Proxy::new(host, 80, ProxyProtocol::Http);
            proxy.speed = speed;
            entries.push(proxy);
        }
        pool.admit(entries).await;

        let fastest = pool.get_fastest_proxy().await.unwrap();
        assert_eq!(fastest.host, "10.0.0.2");

        let random = pool.get_random_valid_proxy().await.unwrap();
        assert!(random.is_valid);
    }

    #[tokio::test]
    async fn empty_pool_selects_nothing() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        assert!(pool.get_fastest_proxy().await.is_none());
        assert!(pool.get_random_valid_proxy().await.is_none());
    }

    #[tokio::test]
    async fn mark_invalid_then_cleanup_then_readmit() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        let proxy = Proxy::new("10.0.0.7", 3128, ProxyProtocol::Http);
        pool.admit(vec![proxy.clone()]).await;
        let id = pool.get_all_proxies().await[0].id.clone().unwrap();

        assert!(pool.mark_proxy_invalid(&id).await);
        // Still visible until cleanup runs.
        assert_eq!(pool.get_stats().await.invalid_proxies, 1);

        assert_eq!(pool.cleanup_invalid().await, 1);
        assert_eq!(pool.get_stats().await.total_proxies, 0);

        // The same relay can be admitted again after eviction.
        assert_eq!(pool.admit(vec![proxy]).await, 1);
    }

    #[tokio::test]
    async fn remove_proxy_reports_existence() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        pool.admit(vec![Proxy::new("10.0.0.8", 80, ProxyProtocol::Http)])
            .await;
        let id = pool.get_all_proxies().await[0].id.clone().unwrap();

        assert!(pool.remove_proxy(&id).await);
        assert!(!pool.remove_proxy(&id).await);
        assert!(!pool.mark_proxy_invalid(&id).await);
    }

    #[tokio::test]
    async fn revalidation_revives_marked_proxies_that_answer() {
        let alive = relay_proxy(spawn_stub_relay(RELAY_OK).await);
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        pool.admit(vec![alive]).await;
        let id = pool.get_all_proxies().await[0].id.clone().unwrap();
        pool.mark_proxy_invalid(&id).await;

        pool.validate_pool().await;

        let revived = &pool.get_all_proxies().await[0];
        assert!(revived.is_valid);
        assert!(revived.speed.is_some());
    }

    #[tokio::test]
    async fn start_acquires_quick_start_cohort() {
        let candidates = live_candidates(2).await;
        let source = Arc::new(StaticSource::new("live", candidates));
        let settings = test_settings(50);
        let pool = pool_over(vec![source], &settings);

        Arc::clone(&pool).start().await;
        // Supply is 2, so the quick-start round admits both.
        assert_eq!(pool.valid_count().await, 2);
        pool.stop().await;

        // A stopped pool refuses further maintenance.
        pool.update_pool().await;
        assert_eq!(pool.get_stats().await.total_proxies, 2);
    }

    #[tokio::test]
    async fn stats_average_ignores_unmeasured_proxies() {
        let settings = test_settings(10);
        let pool = pool_over(vec![], &settings);

        let mut measured = Proxy::new("10.0.0.10", 80, ProxyProtocol::Http);
        measured.speed = Some(0.2);
        let mut measured_slow = Proxy::new("10.0.0.11", 80, ProxyProtocol::Http);
        measured_slow.speed = Some(0.6);
        let unmeasured = Proxy::new("10.0.0.12", 80, ProxyProtocol::Http);

        pool.admit(vec![measured, measured_slow, unmeasured]).await;

        let stats = pool.get_stats().await;
        assert_eq!(stats.valid_proxies, 3);
        let avg = stats.avg_speed.unwrap();
        assert!((avg - 0.4).abs() < 1e-9);
    }
}
