//! # Default Configuration Values
//!
//! Constants and sensible starting points for the pool, the validator, and
//! the forwarder. Everything here can be overridden through the environment
//! (see [`crate::config`]); these are the values used when nothing is set.
//!
//! ## Categories
//!
//! * **Pool tuning** - Target size, refill cadence, warm-up parameters
//! * **Validation** - Probe URL, timeout, concurrency
//! * **Forwarding** - Retry and switch budgets
//! * **User agents** - Rotated when talking to listing endpoints
//! * **Listing sources** - The built-in table of free-proxy listings

use crate::definitions::enums::ProxyProtocol;

/// Target number of valid proxies the pool maintains.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Seconds between full revalidation/refill cycles of the background loop.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 3600;

/// Seconds the background loop waits before its first top-up, giving the
/// service time to finish binding and report healthy.
pub const STARTUP_GRACE_SECS: u64 = 2;

/// Size of the quick-start cohort acquired before the background loop takes
/// over. Ten working proxies are enough to begin serving traffic.
pub const QUICK_START_TARGET: usize = 10;

/// How many candidates to request per needed proxy.
///
/// Free listings validate at roughly a 20% rate, so over-fetching by 5x
/// usually yields one admission per needed slot.
pub const FETCH_MULTIPLIER: usize = 5;

/// Maximum fetch-and-validate rounds per replenishment.
pub const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Number of sources consulted per fetch; the registry cursor rotates so
/// consecutive fetches hit different listings.
pub const MAX_SOURCES_PER_FETCH: usize = 5;

/// URL probed through each candidate during validation.
pub const DEFAULT_VALIDATION_URL: &str = "https://httpbin.org/ip";

/// Seconds a validation probe may take before the candidate is rejected.
pub const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 10;

/// In-flight probe cap for batch validation.
pub const DEFAULT_PARALLEL_VALIDATIONS: usize = 10;

/// Default timeout in seconds for forwarded requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default inner retry budget: attempts on one proxy before switching.
pub const DEFAULT_MAX_RETRIES_PER_PROXY: u32 = 3;

/// Default for the legacy retry knob older clients still send.
pub const DEFAULT_LEGACY_MAX_RETRIES: u32 = 3;

/// Default outer budget: proxies tried before a forwarding call gives up.
pub const DEFAULT_MAX_PROXY_SWITCHES: u32 = 5;

/// Sort key substituted for proxies that have never recorded a probe
/// latency, pushing them behind every measured proxy.
pub const MISSING_SPEED_SENTINEL: f64 = 999.0;

/// User-Agent strings rotated when fetching listing endpoints.
///
/// Listings throttle or block obvious scrapers; varying the agent keeps the
/// fetch path boring.
///
/// # Examples
///
/// ```
/// use proxyforge::definitions::defaults;
///
/// assert!(!defaults::DEFAULT_USER_AGENTS.is_empty());
/// ```
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    // Chrome
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    // Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
    // Edge
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    // Safari
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    // Text browsers keep some listings honest
    "Lynx/2.9.0dev.11 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/3.6.13",
];

/// Regex patterns for extracting proxies from listing responses.
pub mod regex_patterns {
    /// Basic `IP:PORT` pattern, e.g. "203.0.113.9:8080".
    pub const IP_PORT: &str = r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{2,5})";

    /// Scheme-qualified pattern, e.g. "socks5://203.0.113.9:1080".
    pub const TYPED_PROXY: &str =
        r"(https?|socks[45])://(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{2,5})";
}

/// One row of the built-in listing-source table.
///
/// Kept as plain data so [`crate::definitions::source::SourceRegistry`] can
/// build the default registry without this module depending on it.
pub struct ListingSpec {
    /// Short name the proxies fetched from this listing are tagged with.
    pub name: &'static str,

    /// Listing endpoint. A literal `{page}` is substituted when the source
    /// is paged.
    pub url: &'static str,

    /// Extraction pattern applied to the response body.
    pub pattern: &'static str,

    /// Protocol assigned to extracted candidates.
    pub protocol: ProxyProtocol,

    /// How many pages to walk when the URL is paged.
    pub max_pages: usize,
}

/// Built-in free-proxy listings.
///
/// All of these serve plain `IP:PORT` lines, which keeps extraction down to
/// one pattern. Yield varies wildly day to day; the fetch path treats every
/// entry as unreliable.
pub const DEFAULT_LISTINGS: &[ListingSpec] = &[
    ListingSpec {
        name: "proxyscrape-http",
        url: "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=http&timeout=10000&country=all",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Http,
        max_pages: 1,
    },
    ListingSpec {
        name: "proxyscrape-socks5",
        url: "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=socks5&timeout=10000&country=all",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Socks5,
        max_pages: 1,
    },
    ListingSpec {
        name: "thespeedx-http",
        url: "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Http,
        max_pages: 1,
    },
    ListingSpec {
        name: "thespeedx-socks4",
        url: "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks4.txt",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Socks4,
        max_pages: 1,
    },
    ListingSpec {
        name: "thespeedx-socks5",
        url: "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks5.txt",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Socks5,
        max_pages: 1,
    },
    ListingSpec {
        name: "proxy-list-download-http",
        url: "https://www.proxy-list.download/api/v1/get?type=http",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Http,
        max_pages: 1,
    },
    ListingSpec {
        name: "proxy-list-download-socks5",
        url: "https://www.proxy-list.download/api/v1/get?type=socks5",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Socks5,
        max_pages: 1,
    },
    ListingSpec {
        name: "jetkai-http",
        url: "https://raw.githubusercontent.com/jetkai/proxy-list/main/online-proxies/txt/proxies-http.txt",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Http,
        max_pages: 1,
    },
    ListingSpec {
        name: "monosans-http",
        url: "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/http.txt",
        pattern: regex_patterns::IP_PORT,
        protocol: ProxyProtocol::Http,
        max_pages: 1,
    },
];
