//! # Siren Client
//!
//! [`SirenClient`] bundles one transport, one [`Store`] and a [`ClientConfig`]
//! into a session. Every resolution and action run through it shares the
//! session cache and carries the configured default headers.

use crate::action::ExecuteOptions;
use crate::entity::Entity;
use crate::error::Result;
use crate::resolver::{self, Chain, ResolveOptions};
use crate::runtime::ClientConfig;
use crate::store::Store;
use crate::transport::Transport;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A client session: one transport, one store, one configuration.
///
/// Cloning is cheap and clones share the session cache.
#[derive(Clone)]
pub struct SirenClient {
    config: Arc<ClientConfig>,
    store: Store,
    transport: Arc<dyn Transport>,
}

impl SirenClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            store: Store::new(),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Resolve options carrying the session store, policy and headers.
    pub fn options(&self) -> ResolveOptions {
        let mut options = ResolveOptions::default()
            .with_store(self.store.clone())
            .with_auto_fetch(self.config.auto_fetch);
        for (name, value) in &self.config.default_headers {
            options = options.with_header(name.clone(), value.clone());
        }
        options
    }

    /// Resolves a top-level entity by name, relative to the API root.
    #[instrument(skip(self))]
    pub async fn resolve_entity(&self, name: &str) -> Result<Entity> {
        let url = self.config.entity_url(name);
        debug!(%url, "resolve_entity called");
        self.resolve(url).await
    }

    /// Resolves a URL or chain with the session defaults.
    pub async fn resolve(&self, target: impl Into<Chain>) -> Result<Entity> {
        self.resolve_with(target, self.options()).await
    }

    pub async fn resolve_with(
        &self,
        target: impl Into<Chain>,
        options: ResolveOptions,
    ) -> Result<Entity> {
        self.resolve_chain(target.into(), options).await
    }

    #[instrument(name = "resolve", skip(self, chain, options), fields(target = %chain))]
    async fn resolve_chain(&self, chain: Chain, options: ResolveOptions) -> Result<Entity> {
        resolver::resolve(self.transport.as_ref(), chain, &options).await
    }

    /// Resolves the first link of `entity` carrying `rel`. `Ok(None)` when
    /// there is no such link.
    #[instrument(skip(self, entity), fields(url = %entity.url()))]
    pub async fn follow(&self, entity: &Entity, rel: &str) -> Result<Option<Entity>> {
        let Some(link) = entity.link(rel) else {
            debug!("No link to follow");
            return Ok(None);
        };
        self.resolve(link.href).await.map(Some)
    }

    /// Fetches `entity` again, bypassing cache and settled requests. The
    /// fresh entity replaces the old one in the store and is returned.
    #[instrument(skip(self, entity), fields(url = %entity.url()))]
    pub async fn refresh(&self, entity: &Entity) -> Result<Entity> {
        let options = self.options().with_force_fetch(true);
        let fresh = resolver::resolve(self.transport.as_ref(), entity.url(), &options).await?;
        info!("Refreshed");
        Ok(fresh)
    }

    /// Walks `chain` relative to an already resolved entity.
    pub async fn resolve_chain_from(
        &self,
        entity: &Entity,
        chain: impl Into<Chain>,
    ) -> Result<Entity> {
        resolver::resolve_from(self.transport.as_ref(), entity, chain, &self.options()).await
    }

    /// Runs the named action of `entity` through the session transport. On
    /// success the entity holds the response data and is re-cached.
    #[instrument(skip(self, entity, attributes), fields(url = %entity.url()))]
    pub async fn invoke(
        &self,
        entity: &Entity,
        action_name: &str,
        attributes: Map<String, Value>,
    ) -> Result<Entity> {
        let mut options = ExecuteOptions::default()
            .with_attributes(attributes)
            .with_store(self.store.clone());
        for (name, value) in &self.config.default_headers {
            options = options.with_header(name.clone(), value.clone());
        }
        entity
            .invoke(action_name, self.transport.as_ref(), options)
            .await
    }
}
