//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter that
//! hides the module prefix (`with_target(false)`). Verbosity comes from the
//! `RUST_LOG` environment variable.
//!
//! ## What Gets Traced
//!
//! - **Resolution**: `Fetched` (info) per transport call, cache and join
//!   decisions (debug)
//! - **Actions**: `Executing action` (debug) with the planned body, then
//!   `Action synced` (info) or `Action failed` (warn)
//! - **Diagnostics**: missing URLs, unnamed actions and failed auto-fetches
//!   (warn)
//!
//! ## Usage Examples
//!
//! ```bash
//! # Fetches and action results only
//! RUST_LOG=info cargo test
//!
//! # Also show cache hits, joined requests and request bodies
//! RUST_LOG=debug cargo test
//!
//! # Silence diagnostics about incomplete payloads
//! RUST_LOG=error cargo test
//! ```
//!
//! With `RUST_LOG=debug` a chain resolution reads like:
//!
//! ```text
//! INFO resolve: Fetched url="http://api.x.io/orders/42" kind=Model
//! DEBUG resolve: Cached url="http://api.x.io/customers/pj123"
//! DEBUG resolve: Joining request url="http://api.x.io/orders/42"
//! ```

/// Initializes the tracing/logging infrastructure.
///
/// Call once, early. A second call panics because a global subscriber is
/// already installed.
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Session started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
