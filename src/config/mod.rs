//! # Configuration Module
//!
//! Typed runtime settings and their environment loader.
//!
//! ## Components
//!
//! * **schema** - The [`schema::Settings`] shape and defaults
//! * **loader** - Environment parsing on top of the defaults

pub mod loader;
pub mod schema;

pub use schema::Settings;
