use super::{Chain, ResolveOptions};
use crate::entity::parser::pending_fetches;
use crate::entity::{parse, parse_value, AutoFetch, Entity, EntityEvent};
use crate::error::{Result, SirenError};
use crate::model::SirenPayload;
use crate::store::request::SettleGuard;
use crate::store::{Freshness, Plan, RequestHandle, Store};
use crate::transport::{Request, Transport, TransportFailure};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, warn};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(super) struct Resolver<'a> {
    transport: &'a dyn Transport,
    store: Store,
    options: &'a ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub(super) fn new(transport: &'a dyn Transport, options: &'a ResolveOptions) -> Self {
        Self {
            transport,
            store: options.store.clone().unwrap_or_else(Store::detached),
            options,
        }
    }

    /// Resolves the chain's root, then walks the rest of it.
    pub(super) fn resolve_chain(
        &self,
        chain: Chain,
        freshness: Freshness,
    ) -> BoxFuture<'_, Result<Entity>> {
        self.resolve_within(chain, freshness, Vec::new())
    }

    /// `ancestors` are the URLs whose auto-fetch is in progress above this
    /// resolution.
    fn resolve_within(
        &self,
        mut chain: Chain,
        freshness: Freshness,
        ancestors: Vec<String>,
    ) -> BoxFuture<'_, Result<Entity>> {
        Box::pin(async move {
            let url = chain.pop_front().unwrap_or_default();
            let tail = chain;

            match self.store.plan(&url, freshness, tail.is_empty()) {
                Plan::Reuse(handle) => {
                    debug!(%url, "Reusing settled request");
                    handle.settled().await
                }
                Plan::Join(handle) => {
                    debug!(%url, "Joining request");
                    let entity = handle.settled().await?;
                    self.walk(entity, tail, freshness).await
                }
                Plan::Cached(entity) => {
                    debug!(%url, "Cache hit");
                    self.walk(entity, tail, freshness).await
                }
                Plan::Fetch(handle) => {
                    let entity = self.fetch(&url, handle, ancestors).await?;
                    self.walk(entity, tail, freshness).await
                }
            }
        })
    }

    /// Follows `tail` one sub-entity at a time, starting at `entity`.
    pub(super) fn walk(
        &self,
        entity: Entity,
        mut tail: Chain,
        freshness: Freshness,
    ) -> BoxFuture<'_, Result<Entity>> {
        Box::pin(async move {
            if tail.is_empty() {
                return Ok(entity);
            }
            let Some(segment) = tail.pop_front() else {
                return Ok(entity);
            };
            let Some(child) = entity.child(&segment) else {
                return Err(SirenError::MissingSubEntity {
                    name: segment,
                    url: entity.url(),
                });
            };

            let url = child.url();
            if url.is_empty() {
                return self.walk(child, tail, freshness).await;
            }
            if !child.is_linked() && freshness != Freshness::Forced {
                let current = self
                    .store
                    .get(&url)
                    .filter(|cached| !cached.is_linked())
                    .unwrap_or(child);
                return self.walk(current, tail, freshness).await;
            }
            self.resolve_chain(Chain::rooted(url, tail), freshness).await
        })
    }

    /// Fetches `url` and settles `handle` with the outcome.
    ///
    /// The handle settles as soon as the root entity is parsed, before any
    /// sub-entity is auto-fetched.
    async fn fetch(
        &self,
        url: &str,
        handle: RequestHandle,
        ancestors: Vec<String>,
    ) -> Result<Entity> {
        let guard = SettleGuard::new(handle);
        let request = Request::get(url).with_headers(self.options.headers.iter().cloned());

        match self.transport.fetch(request).await {
            Ok(body) => match parse_value(body, &self.store) {
                Ok(entity) => {
                    guard.resolve(entity.clone());
                    info!(%url, kind = ?entity.kind(), "Fetched");
                    self.hydrate(&entity, ancestors).await;
                    entity.emit(EntityEvent::Resolved);
                    Ok(entity)
                }
                Err(error) => {
                    warn!(%url, %error, "Response is not a siren entity");
                    guard.reject(error.clone());
                    Err(error)
                }
            },
            Err(failure) => {
                warn!(%url, %failure, "Fetch failed");
                let error = SirenError::Transport {
                    url: url.to_owned(),
                    entity: error_entity(&failure),
                    failure,
                };
                guard.reject(error.clone());
                Err(error)
            }
        }
    }

    /// Fetches the sub-entities the auto-fetch policy asks for and puts them
    /// in place. Failures leave the original slot untouched.
    ///
    /// A sub-entity pointing back at an entity still being hydrated stays a
    /// link stub, so auto-fetch never builds a cyclic graph.
    async fn hydrate(&self, entity: &Entity, mut ancestors: Vec<String>) {
        let policy = self.options.auto_fetch;
        let freshness = match policy {
            AutoFetch::All => Freshness::Network,
            _ => Freshness::Cached,
        };
        ancestors.push(entity.url());

        for (index, url) in pending_fetches(entity, policy) {
            if ancestors.contains(&url) {
                debug!(%url, "Leaving cyclic link as a stub");
                continue;
            }
            let chain = Chain::from(vec![url.clone()]);
            match self.resolve_within(chain, freshness, ancestors.clone()).await {
                Ok(sub) => entity.replace_sub_entity(index, sub),
                Err(error) => warn!(%url, %error, "Could not auto-fetch sub-entity"),
            }
        }
    }
}

/// Best-effort error entity from a failure body. Bodies that are not a Siren
/// object yield an empty entity.
fn error_entity(failure: &TransportFailure) -> Entity {
    let payload = serde_json::from_str(&failure.body)
        .ok()
        .and_then(|value| SirenPayload::from_value(value).ok())
        .unwrap_or_default();
    parse(payload, &Store::detached())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    #[test]
    fn test_error_entity_from_siren_body() {
        let failure = TransportFailure::status(
            404,
            json!({ "class": ["error"], "properties": { "message": "gone" } }).to_string(),
        );
        let entity = error_entity(&failure);
        assert!(entity.is_error());
        assert_eq!(entity.error_message().as_deref(), Some("gone"));
    }

    #[test]
    fn test_error_entity_from_garbage_body() {
        let entity = error_entity(&TransportFailure::status(500, "<html>oops</html>"));
        assert!(entity.properties().is_empty());
        assert!(entity.is_new());
    }

    #[tokio::test]
    async fn test_non_object_response_rejects_the_request() {
        let mock = MockTransport::new();
        mock.expect_get("/list").return_ok(json!([1, 2, 3]));
        let store = Store::new();
        let options = ResolveOptions::default().with_store(store.clone());

        let result = crate::resolver::resolve(&mock, "/list", &options).await;
        assert!(matches!(result, Err(SirenError::Payload(_))));
        assert_eq!(
            store.get_request("/list").unwrap().status(),
            crate::store::RequestStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_headers_are_forwarded() {
        let mock = MockTransport::new();
        mock.expect_get("/a").return_ok(json!({ "href": "/a", "properties": {} }));
        let options = ResolveOptions::default().with_header("Authorization", "Bearer t");

        crate::resolver::resolve(&mock, "/a", &options).await.unwrap();
        assert_eq!(
            mock.calls()[0].headers,
            vec![("Authorization".to_string(), "Bearer t".to_string())]
        );
    }
}
