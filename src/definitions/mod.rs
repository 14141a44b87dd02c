//! # Definitions Module
//!
//! Core data types for the proxy pool service: the proxy record itself,
//! listing sources, request/response models, shared enumerations, error
//! types, and default values.
//!
//! ## Components
//!
//! * **proxy** - The `Proxy` record with URL synthesis and probe bookkeeping
//! * **source** - Listing sources and the rotating registry
//! * **request** - Forwarding request/response models and the API envelope
//! * **enums** - Protocols, HTTP methods, and the error taxonomy
//! * **errors** - Domain error enums and `Result` aliases
//! * **defaults** - Tunables and the built-in listing table

pub mod defaults;
pub mod enums;
pub mod errors;
pub mod proxy;
pub mod request;
pub mod source;

pub use enums::{ErrorKind, HttpMethod, ProxyProtocol};
pub use errors::{
    ConfigError, ConfigResult, ForwardError, ForwardResult, ProxyError, ProxyResult,
    RequestResult, RequestorError, SourceError, SourceResult, UtilError, UtilResult,
};
pub use proxy::Proxy;
pub use request::{ApiResponse, ForwardResponse, RequestSpec, RetryPlan};
pub use source::{ListingSource, ProxySource, SourceRegistry};
