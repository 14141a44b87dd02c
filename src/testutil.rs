//! Shared test fixtures: canned listing sources and loopback relay stubs.

use crate::definitions::enums::ProxyProtocol;
use crate::definitions::errors::{SourceError, SourceResult};
use crate::definitions::proxy::Proxy;
use crate::definitions::source::ProxySource;
use crate::io::http::Requestor;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned HTTP 200 a stub relay can answer with.
pub(crate) const RELAY_OK: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";

/// Canned HTTP 503 a stub relay can answer with.
pub(crate) const RELAY_UNAVAILABLE: &[u8] =
    b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Spawns a loopback relay answering every connection with `response`.
///
/// Serves absolute-form requests the way an HTTP proxy would, which is all
/// the validator and forwarder need from it.
pub(crate) async fn spawn_stub_relay(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A port with nothing listening on it.
pub(crate) async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A proxy record pointing at a loopback relay.
pub(crate) fn relay_proxy(addr: SocketAddr) -> Proxy {
    Proxy::new(addr.ip().to_string(), addr.port(), ProxyProtocol::Http)
}

/// A listing source serving a canned candidate list (or a canned failure),
/// counting how many times it is fetched.
pub(crate) struct StaticSource {
    name: String,
    yields: Vec<Proxy>,
    fail: bool,
    pub(crate) calls: AtomicUsize,
}

impl StaticSource {
    pub(crate) fn new(name: &str, yields: Vec<Proxy>) -> Self {
        StaticSource {
            name: name.to_string(),
            yields,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn of_endpoints(name: &str, endpoints: &[(&str, u16)]) -> Self {
        let yields = endpoints
            .iter()
            .map(|(host, port)| {
                Proxy::new(*host, *port, ProxyProtocol::Http).with_source(name.to_string())
            })
            .collect();
        StaticSource::new(name, yields)
    }

    pub(crate) fn failing(name: &str) -> Self {
        StaticSource {
            name: name.to_string(),
            yields: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _requestor: &Requestor) -> SourceResult<Vec<Proxy>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::FetchFailure(format!("{} is down", self.name)));
        }
        Ok(self
            .yields
            .iter()
            .map(|proxy| proxy.clone().with_source(self.name.clone()))
            .collect())
    }
}
