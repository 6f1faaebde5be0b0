//! Session-level entry point over the resolver, store and action executor.

pub mod siren_client;

pub use siren_client::*;
