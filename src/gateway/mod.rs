//! # Gateway Module
//!
//! The HTTP surface of the service: a thin axum layer over the pool and the
//! forwarder. Handlers only translate between JSON shapes and the
//! orchestration calls; no pool or retry logic lives here.
//!
//! ## Components
//!
//! * **server** - Router assembly, shared state, bind-and-serve
//! * **proxy_api** - Pool inspection and maintenance endpoints
//! * **request_api** - The forwarding endpoint

pub mod proxy_api;
pub mod request_api;
pub mod server;

pub use server::{AppState, build_router, serve};
