//! # Entity Store
//!
//! The session cache. It maps canonical URLs to hydrated entities and URLs to
//! [`RequestHandle`]s. It never evicts on its own: entries live as long as the
//! session unless the caller calls [`Store::clear`].
//!
//! ## Concurrency Model
//! Both maps sit behind one mutex that is only held for plain map operations,
//! never across an `.await`. [`Store::plan`] performs the "is this URL already
//! being fetched?" check and the registration of a new pending handle in one
//! critical section, so two resolutions racing for the same URL can never both
//! decide to fetch.

pub mod request;

pub use request::{RequestHandle, RequestStatus};

use crate::entity::Entity;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Default)]
struct StoreState {
    entities: HashMap<String, Entity>,
    requests: HashMap<String, RequestHandle>,
}

/// Shared, cheaply cloneable session cache.
///
/// A [`Store::detached`] store is a stand-in that ignores every write and
/// answers every lookup with nothing, which disables caching and request
/// deduplication for stand-alone calls.
#[derive(Clone)]
pub struct Store {
    shared: Option<Arc<Mutex<StoreState>>>,
}

/// Anything the store can be keyed by: a URL or an entity (by its URL).
pub trait StoreKey {
    fn store_key(&self) -> String;
}

impl StoreKey for str {
    fn store_key(&self) -> String {
        self.to_owned()
    }
}

impl StoreKey for String {
    fn store_key(&self) -> String {
        self.clone()
    }
}

impl StoreKey for Entity {
    fn store_key(&self) -> String {
        self.url()
    }
}

/// How much a resolution may rely on what the store already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Freshness {
    /// Use a settled request or a cached entity when there is one.
    Cached,
    /// Ignore cached entities, but reuse a request that was already made.
    Network,
    /// Always fetch, unless a fetch for the URL is in flight right now.
    Forced,
}

/// What the resolution engine should do for a root URL.
#[derive(Debug)]
pub(crate) enum Plan {
    /// A settled request can be handed back as is.
    Reuse(RequestHandle),
    /// A request for the URL is in flight (or settled and reusable); wait for
    /// it, then keep walking.
    Join(RequestHandle),
    /// A hydrated entity is cached; no network needed.
    Cached(Entity),
    /// Nothing usable: the caller must fetch and settle this freshly
    /// registered handle.
    Fetch(RequestHandle),
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock() {
            Some(state) => f
                .debug_struct("Store")
                .field("entities", &state.entities.len())
                .field("requests", &state.requests.len())
                .finish(),
            None => f.write_str("Store(detached)"),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A new, empty session cache.
    pub fn new() -> Self {
        Self {
            shared: Some(Arc::new(Mutex::new(StoreState::default()))),
        }
    }

    /// A no-op store: writes are dropped and lookups find nothing.
    pub fn detached() -> Self {
        Self { shared: None }
    }

    pub fn is_detached(&self) -> bool {
        self.shared.is_none()
    }

    fn lock(&self) -> Option<MutexGuard<'_, StoreState>> {
        self.shared
            .as_ref()
            .map(|shared| shared.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Caches `entity` under its canonical URL, overwriting any previous
    /// entry. Collections register every member first, then themselves.
    /// Returns the same entity.
    pub fn add(&self, entity: &Entity) -> Entity {
        if self.is_detached() {
            return entity.clone();
        }

        let mut pending = Vec::new();
        collect_entries(entity, &mut pending);

        if let Some(mut state) = self.lock() {
            for (url, item) in pending {
                debug!(%url, "Cached");
                state.entities.insert(url, item);
            }
        }
        entity.clone()
    }

    pub fn get<K: StoreKey + ?Sized>(&self, key: &K) -> Option<Entity> {
        let key = key.store_key();
        self.lock()?.entities.get(&key).cloned()
    }

    pub fn exists<K: StoreKey + ?Sized>(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Every cached entity whose URL matches `pattern`, ordered by URL.
    pub fn filter(&self, pattern: &Regex) -> Vec<Entity> {
        let Some(state) = self.lock() else {
            return Vec::new();
        };
        let mut matches: Vec<(&String, &Entity)> = state
            .entities
            .iter()
            .filter(|(url, _)| pattern.is_match(url))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.into_iter().map(|(_, entity)| entity.clone()).collect()
    }

    /// Registers `handle` for `url` and hands it back.
    pub fn add_request(&self, url: &str, handle: RequestHandle) -> RequestHandle {
        if let Some(mut state) = self.lock() {
            state.requests.insert(url.to_owned(), handle.clone());
        }
        handle
    }

    pub fn get_request(&self, url: &str) -> Option<RequestHandle> {
        self.lock()?.requests.get(url).cloned()
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |state| state.entities.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached entity and request handle.
    pub fn clear(&self) {
        if let Some(mut state) = self.lock() {
            state.entities.clear();
            state.requests.clear();
        }
    }

    /// Decides how to obtain `url`, registering a pending handle when a fetch
    /// is needed. Lookup and registration happen under one lock.
    pub(crate) fn plan(&self, url: &str, freshness: Freshness, tail_is_empty: bool) -> Plan {
        let Some(mut state) = self.lock() else {
            return Plan::Fetch(RequestHandle::pending(url));
        };

        if let Some(handle) = state.requests.get(url) {
            match handle.status() {
                RequestStatus::Pending => return Plan::Join(handle.clone()),
                RequestStatus::Resolved if freshness != Freshness::Forced && tail_is_empty => {
                    return Plan::Reuse(handle.clone());
                }
                RequestStatus::Resolved if freshness == Freshness::Network => {
                    return Plan::Join(handle.clone());
                }
                _ => {}
            }
        }

        if freshness == Freshness::Cached {
            if let Some(entity) = state.entities.get(url).filter(|e| !e.is_linked()) {
                return Plan::Cached(entity.clone());
            }
        }

        let handle = RequestHandle::pending(url);
        state.requests.insert(url.to_owned(), handle.clone());
        Plan::Fetch(handle)
    }
}

fn collect_entries(entity: &Entity, out: &mut Vec<(String, Entity)>) {
    for member in entity.members() {
        collect_entries(&member, out);
    }
    let url = entity.url();
    if url.is_empty() {
        warn!(kind = ?entity.kind(), "Not caching an entity without a url");
        return;
    }
    out.push((url, entity.clone()));
}
