//! # Source Module
//!
//! Listing sources: the places candidate proxies come from, and the
//! registry that rotates between them.
//!
//! ## Overview
//!
//! A listing source is anything that can produce a finite batch of proxy
//! candidates. The [`ProxySource`] trait is the whole contract; the
//! implementation shipped here, [`ListingSource`], fetches a listing URL and
//! extracts `IP:PORT` candidates with a regex. The [`SourceRegistry`] keeps
//! the ordered set of sources and a rotating cursor so consecutive fetches
//! start from different listings, spreading load and diversifying yield.
//!
//! ## Examples
//!
//! ```
//! use proxyforge::definitions::source::SourceRegistry;
//!
//! let registry = SourceRegistry::with_defaults();
//! assert!(!registry.is_empty());
//!
//! // Two consecutive selections start at different listings.
//! let first = registry.select_batch();
//! let second = registry.select_batch();
//! assert_ne!(first[0].name(), second[0].name());
//! ```

use crate::definitions::{
    defaults::{self, ListingSpec},
    enums::ProxyProtocol,
    errors::{SourceError, SourceResult},
    proxy::Proxy,
};
use crate::io::http::Requestor;
use crate::utils::{self, SerializableRegex};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A producer of proxy candidates.
///
/// Implementations are opaque to the rest of the system: the fetcher only
/// ever asks for a name (used for tagging and reporting) and a batch of
/// candidates. Errors are reported through the result channel and handled at
/// the fetch boundary; a failing source never takes down a fetch round.
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// Short name candidates from this source are tagged with.
    fn name(&self) -> &str;

    /// Produces one batch of candidates.
    async fn fetch(&self, requestor: &Requestor) -> SourceResult<Vec<Proxy>>;
}

/// A third-party web listing of free proxies.
///
/// Fetches the listing URL (walking pages when the URL carries a `{page}`
/// placeholder) and extracts candidates with a compiled regex. Keeps
/// lightweight use/failure counters for log visibility.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::source::ListingSource;
/// use proxyforge::definitions::enums::ProxyProtocol;
///
/// let source = ListingSource::new(
///     "example",
///     "https://example.com/proxies.txt",
///     r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{2,5})",
///     ProxyProtocol::Http,
///     1,
/// )
/// .unwrap();
///
/// let found = source.extract_candidates("10.0.0.1:8080\n10.0.0.2:3128\n");
/// assert_eq!(found.len(), 2);
/// ```
pub struct ListingSource {
    /// Short name candidates are tagged with.
    name: String,

    /// Listing endpoint; `{page}` is substituted when paging.
    url: String,

    /// Extraction pattern applied to each response body.
    pattern: SerializableRegex,

    /// Protocol assigned to extracted candidates.
    protocol: ProxyProtocol,

    /// Pages walked when the URL is paged.
    max_pages: usize,

    /// Times this listing has been fetched.
    use_count: AtomicUsize,

    /// Times a fetch of this listing has failed.
    failure_count: AtomicUsize,
}

impl ListingSource {
    /// Creates a listing source, validating the URL and pattern up front.
    ///
    /// # Errors
    ///
    /// * [`SourceError::InvalidUrl`] for a malformed listing URL
    /// * [`SourceError::InvalidRegexPattern`] for an uncompilable pattern
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        pattern: &str,
        protocol: ProxyProtocol,
        max_pages: usize,
    ) -> SourceResult<Self> {
        let url = url.into();
        if !utils::is_valid_url(&url) {
            return Err(SourceError::InvalidUrl(url));
        }

        let pattern = SerializableRegex::new(pattern)
            .map_err(|e| SourceError::InvalidRegexPattern(e.to_string()))?;

        Ok(ListingSource {
            name: name.into(),
            url,
            pattern,
            protocol,
            max_pages: max_pages.max(1),
            use_count: AtomicUsize::new(0),
            failure_count: AtomicUsize::new(0),
        })
    }

    /// Builds a source from a built-in listing table row.
    pub fn from_spec(spec: &ListingSpec) -> SourceResult<Self> {
        ListingSource::new(
            spec.name,
            spec.url,
            spec.pattern,
            spec.protocol,
            spec.max_pages,
        )
    }

    /// Extracts candidates from a listing response body.
    ///
    /// Matches that fail to parse as `host:port` are skipped; the listing
    /// format is not under our control.
    #[must_use]
    pub fn extract_candidates(&self, body: &str) -> Vec<Proxy> {
        let mut candidates = Vec::new();

        for found in self.pattern.find_iter(body) {
            let Ok(m) = found else { continue };

            if let Some((host, port_str)) = m.as_str().split_once(':') {
                if let Ok(port) = port_str.parse::<u16>() {
                    if port == 0 {
                        continue;
                    }
                    candidates.push(
                        Proxy::new(host, port, self.protocol).with_source(self.name.clone()),
                    );
                }
            }
        }

        candidates
    }

    /// Times this listing has been fetched.
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.use_count.load(Ordering::Relaxed)
    }

    /// Times a fetch of this listing has failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    fn page_url(&self, page: usize) -> String {
        self.url.replace("{page}", &page.to_string())
    }
}

#[async_trait]
impl ProxySource for ListingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, requestor: &Requestor) -> SourceResult<Vec<Proxy>> {
        self.use_count.fetch_add(1, Ordering::Relaxed);

        let paged = self.url.contains("{page}");
        let pages = if paged { self.max_pages } else { 1 };
        let mut candidates = Vec::new();

        for page in 1..=pages {
            let url = self.page_url(page);
            match requestor.get(&url, utils::get_random_user_agent()).await {
                Ok(body) => {
                    let mut found = self.extract_candidates(&body);
                    debug!("{}: page {page} yielded {} candidates", self.name, found.len());
                    candidates.append(&mut found);
                }
                Err(e) if page == 1 => {
                    self.failure_count.fetch_add(1, Ordering::Relaxed);
                    return Err(SourceError::FetchFailure(format!("{}: {e}", self.name)));
                }
                Err(e) => {
                    // Later pages failing just ends the walk early.
                    debug!("{}: page {page} failed: {e}", self.name);
                    break;
                }
            }
        }

        Ok(candidates)
    }
}

/// Ordered set of listing sources with a rotating selection cursor.
///
/// Selection takes `min(5, len)` sources starting at the cursor and advances
/// it by the batch width, so back-to-back fetches consult different
/// listings.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn ProxySource>>,
    cursor: AtomicUsize,
}

impl SourceRegistry {
    /// Creates a registry over the given sources, preserving order.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn ProxySource>>) -> Self {
        SourceRegistry {
            sources,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Builds the registry from the built-in listing table.
    ///
    /// A table row that fails validation is logged and skipped rather than
    /// aborting startup; the table is static, so in practice this is a
    /// no-op path.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut sources: Vec<Arc<dyn ProxySource>> = Vec::new();

        for spec in defaults::DEFAULT_LISTINGS {
            match ListingSource::from_spec(spec) {
                Ok(source) => sources.push(Arc::new(source)),
                Err(e) => warn!("Skipping listing {}: {e}", spec.name),
            }
        }

        SourceRegistry::new(sources)
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every registered source, in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn ProxySource>> {
        self.sources.clone()
    }

    /// Selects the next rotation batch: `min(5, len)` sources starting at
    /// the cursor, advancing the cursor past them.
    #[must_use]
    pub fn select_batch(&self) -> Vec<Arc<dyn ProxySource>> {
        if self.sources.is_empty() {
            return Vec::new();
        }

        let k = defaults::MAX_SOURCES_PER_FETCH.min(self.sources.len());
        let start = self.cursor.fetch_add(k, Ordering::Relaxed);

        (0..k)
            .map(|i| Arc::clone(&self.sources[(start + i) % self.sources.len()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::defaults::regex_patterns;

    fn listing(name: &str) -> ListingSource {
        ListingSource::new(
            name,
            "https://example.com/list.txt",
            regex_patterns::IP_PORT,
            ProxyProtocol::Http,
            1,
        )
        .unwrap()
    }

    #[test]
    fn extraction_parses_and_tags() {
        let source = listing("tagger");
        let body = "junk 10.0.0.1:8080 more junk\n10.0.0.2:3128\nnot-a-proxy:99999\n";

        let found = source.extract_candidates(body);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].proxy_url(), "http://10.0.0.1:8080");
        assert_eq!(found[0].source.as_deref(), Some("tagger"));
    }

    #[test]
    fn extraction_skips_port_zero() {
        let source = listing("zeros");
        let found = source.extract_candidates("10.0.0.1:00\n10.0.0.2:80\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].port, 80);
    }

    #[test]
    fn invalid_listing_url_is_rejected() {
        let result = ListingSource::new(
            "broken",
            "not a url",
            regex_patterns::IP_PORT,
            ProxyProtocol::Http,
            1,
        );
        assert!(matches!(result, Err(SourceError::InvalidUrl(_))));
    }

    #[test]
    fn registry_rotates_cursor_between_batches() {
        let sources: Vec<Arc<dyn ProxySource>> = (0..7)
            .map(|i| Arc::new(listing(&format!("s{i}"))) as Arc<dyn ProxySource>)
            .collect();
        let registry = SourceRegistry::new(sources);

        let first: Vec<String> = registry
            .select_batch()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        let second: Vec<String> = registry
            .select_batch()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        assert_eq!(first, vec!["s0", "s1", "s2", "s3", "s4"]);
        // Cursor advanced by 5, wrapping over the 7 registered sources.
        assert_eq!(second, vec!["s5", "s6", "s0", "s1", "s2"]);
    }

    #[test]
    fn small_registry_selects_everything() {
        let sources: Vec<Arc<dyn ProxySource>> = (0..3)
            .map(|i| Arc::new(listing(&format!("s{i}"))) as Arc<dyn ProxySource>)
            .collect();
        let registry = SourceRegistry::new(sources);

        assert_eq!(registry.select_batch().len(), 3);
    }

    #[test]
    fn default_registry_is_populated() {
        let registry = SourceRegistry::with_defaults();
        assert_eq!(registry.len(), defaults::DEFAULT_LISTINGS.len());
    }
}
