//! Runtime wiring shared by every client session.
//!
//! - [`ClientConfig`] - API root, auto-fetch policy and default headers
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use config::ClientConfig;
