//! # ProxyForge
//!
//! A self-replenishing pool of free HTTP/SOCKS proxies behind a forwarding
//! HTTP gateway.
//!
//! ## Overview
//!
//! ProxyForge keeps a pool of validated, latency-ranked proxies stocked
//! from free listing sources and forwards arbitrary client requests
//! through them, rotating relays on failure:
//!
//! * Acquisition from a rotating registry of listing sources
//! * Bounded-concurrency liveness probing with latency measurement
//! * Pool maintenance: replenishment, periodic revalidation, and
//!   threshold-triggered background refill
//! * Two-level retry forwarding: per-proxy retries inside a proxy-switch
//!   loop, with a classified error taxonomy
//! * An HTTP gateway exposing the pool and the forwarder
//!
//! ## Examples
//!
//! ```no_run
//! use proxyforge::{Fetcher, Forwarder, ProxyPool, Requestor, Settings, Validator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default();
//!     let fetcher = Fetcher::with_defaults();
//!     let validator = Validator::from_settings(&settings);
//!
//!     let pool = Arc::new(ProxyPool::new(&settings, fetcher.clone(), validator));
//!     let forwarder = Forwarder::new(Arc::new(Requestor::new()), &settings);
//!
//!     Arc::clone(&pool).start().await;
//!     if let Some(proxy) = pool.get_fastest_proxy().await {
//!         println!("fastest relay: {}", proxy.proxy_url());
//!     }
//!     let _ = forwarder;
//!     pool.stop().await;
//! }
//! ```

#![warn(missing_docs)]

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod config;
pub mod definitions;
pub mod gateway;
pub mod inspection;
pub mod io;
pub mod orchestration;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for easier access
pub use config::Settings;
pub use definitions::{
    defaults,
    enums::{ErrorKind, HttpMethod, ProxyProtocol},
    errors::{ForwardError, ProxyError, RequestorError, SourceError},
    proxy::Proxy,
    request::{ApiResponse, ForwardResponse, RequestSpec},
    source::{ListingSource, ProxySource, SourceRegistry},
};
pub use gateway::{AppState, build_router, serve};
pub use inspection::Validator;
pub use io::http::{Requestor, Transport};
pub use orchestration::{Fetcher, Forwarder, PoolStats, ProxyPool, ProxyProvider};
