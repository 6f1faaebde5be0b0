//! # Resolution
//!
//! Resolving turns a URL or a `#`-delimited chain (`url#customer#address`)
//! into a hydrated [`Entity`]. The root is obtained from the store when
//! possible and from the transport otherwise; each following segment walks
//! one sub-entity deeper, fetching only the segments that are link stubs.
//!
//! Two resolutions of the same URL that overlap in time share one transport
//! call: the second joins the first one's pending
//! [`RequestHandle`](crate::store::RequestHandle).
//!
//! ```ignore
//! let store = Store::new();
//! let options = ResolveOptions::default().with_store(store.clone());
//! let address = resolve(&transport, "http://api.x.io/orders/42#customer#address", &options).await?;
//! ```

pub mod chain;
mod engine;

pub use chain::{parse_chain, Chain};

use crate::entity::{AutoFetch, Entity};
use crate::error::Result;
use crate::store::{Freshness, Store};
use crate::transport::Transport;
use engine::Resolver;

/// Per-call resolution settings.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Session cache. Without one nothing is cached or deduplicated.
    pub store: Option<Store>,
    /// Skip cached entities and settled requests for every segment.
    pub force_fetch: bool,
    pub auto_fetch: AutoFetch,
    /// Extra headers on every fetch.
    pub headers: Vec<(String, String)>,
}

impl ResolveOptions {
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_force_fetch(mut self, force_fetch: bool) -> Self {
        self.force_fetch = force_fetch;
        self
    }

    pub fn with_auto_fetch(mut self, auto_fetch: AutoFetch) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn freshness(&self) -> Freshness {
        if self.force_fetch {
            Freshness::Forced
        } else {
            Freshness::Cached
        }
    }
}

/// Resolves `target`, a URL or chain, to a single entity.
pub async fn resolve(
    transport: &dyn Transport,
    target: impl Into<Chain>,
    options: &ResolveOptions,
) -> Result<Entity> {
    let chain = target.into();
    Resolver::new(transport, options)
        .resolve_chain(chain, options.freshness())
        .await
}

/// Walks `chain` starting from an already resolved `entity`.
pub async fn resolve_from(
    transport: &dyn Transport,
    entity: &Entity,
    chain: impl Into<Chain>,
    options: &ResolveOptions,
) -> Result<Entity> {
    let chain = chain.into();
    Resolver::new(transport, options)
        .walk(entity.clone(), chain, options.freshness())
        .await
}
