//! # IO Module
//!
//! Outbound network access for the service.
//!
//! ## Components
//!
//! * **http** - The [`http::Requestor`] and the [`http::Transport`] seam

pub mod http;

pub use http::{Requestor, Transport};
