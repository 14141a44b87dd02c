//! # Fetcher Module
//!
//! Turns the source registry into batches of deduplicated candidates, and
//! produces the per-source yield report behind the test-sources endpoint.
//!
//! ## Overview
//!
//! A fetch consults the next rotation batch of listings, concatenates their
//! yields, deduplicates by proxy URL (first seen wins, keeping its source
//! tag), and truncates at the requested count. A listing that fails is
//! logged and skipped; the fetch only comes back empty when every consulted
//! listing failed or yielded nothing.

use crate::definitions::{proxy::Proxy, source::SourceRegistry};
use crate::io::http::Requestor;
use crate::orchestration::threading;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// One listing's outcome in a source probe report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceProbe {
    /// Listing name.
    pub source: String,

    /// Candidates the listing yielded.
    pub count: usize,

    /// "success", "no_proxies", or "failed".
    pub status: &'static str,

    /// Failure detail, present only when `status` is "failed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome of probing every registered listing once.
#[derive(Debug, Clone, Serialize)]
pub struct SourceProbeReport {
    /// Per-listing outcomes, sorted by yield descending.
    pub sources: Vec<SourceProbe>,

    /// Number of registered listings.
    pub total_sources: usize,

    /// Listings that yielded at least one candidate.
    pub successful_sources: usize,

    /// Candidates yielded across all listings.
    pub total_proxies: usize,
}

/// Fetches candidate batches from the rotating source registry.
///
/// Cheap to clone; clones share the registry (and its rotation cursor).
#[derive(Clone)]
pub struct Fetcher {
    registry: Arc<SourceRegistry>,
    requestor: Requestor,
}

impl Fetcher {
    /// Creates a fetcher over the given registry.
    #[must_use]
    pub fn new(registry: Arc<SourceRegistry>, requestor: Requestor) -> Self {
        Fetcher {
            registry,
            requestor,
        }
    }

    /// Creates a fetcher over the built-in listing table.
    #[must_use]
    pub fn with_defaults() -> Self {
        Fetcher::new(Arc::new(SourceRegistry::with_defaults()), Requestor::new())
    }

    /// The registry this fetcher draws from.
    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetches up to `target_count` deduplicated candidates.
    ///
    /// Consults the next rotation batch of listings in order, stopping
    /// early once the raw yield covers the target. Failing listings are
    /// logged and skipped. Duplicate URLs keep their first occurrence.
    #[must_use]
    pub async fn fetch(&self, target_count: usize) -> Vec<Proxy> {
        if target_count == 0 || self.registry.is_empty() {
            return Vec::new();
        }

        let batch = self.registry.select_batch();
        let names: Vec<&str> = batch.iter().map(|s| s.name()).collect();
        info!(
            "Fetching up to {target_count} candidates from: {}",
            names.join(", ")
        );

        let mut raw: Vec<Proxy> = Vec::new();
        for source in &batch {
            match source.fetch(&self.requestor).await {
                Ok(found) => {
                    info!("{} yielded {} candidates", source.name(), found.len());
                    raw.extend(found);
                    if raw.len() >= target_count {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Skipping source {}: {e}", source.name());
                }
            }
        }

        let unique = dedup_first_seen(raw, target_count);
        info!("Fetch produced {} unique candidates", unique.len());
        unique
    }

    /// Fetches every registered listing once and reports per-listing yield,
    /// sorted by yield descending.
    #[must_use]
    pub async fn probe_all_sources(&self, concurrency: usize) -> SourceProbeReport {
        let sources = self.registry.all();
        let total_sources = sources.len();

        let requestor = self.requestor.clone();
        let mut probes = threading::run_concurrent_batch(sources, concurrency, |source| {
            let requestor = requestor.clone();
            async move {
                match source.fetch(&requestor).await {
                    Ok(found) if found.is_empty() => SourceProbe {
                        source: source.name().to_string(),
                        count: 0,
                        status: "no_proxies",
                        error: None,
                    },
                    Ok(found) => SourceProbe {
                        source: source.name().to_string(),
                        count: found.len(),
                        status: "success",
                        error: None,
                    },
                    Err(e) => SourceProbe {
                        source: source.name().to_string(),
                        count: 0,
                        status: "failed",
                        error: Some(e.to_string()),
                    },
                }
            }
        })
        .await;

        probes.sort_by(|a, b| b.count.cmp(&a.count));

        let successful_sources = probes.iter().filter(|p| p.count > 0).count();
        let total_proxies = probes.iter().map(|p| p.count).sum();

        SourceProbeReport {
            sources: probes,
            total_sources,
            successful_sources,
            total_proxies,
        }
    }
}

/// Deduplicates by proxy URL preserving first-seen order, truncating at
/// `limit`.
fn dedup_first_seen(candidates: Vec<Proxy>, limit: usize) -> Vec<Proxy> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for proxy in candidates {
        if seen.insert(proxy.proxy_url()) {
            unique.push(proxy);
            if unique.len() >= limit {
                break;
            }
        }
    }

    unique
}
