//! # Request Handles
//!
//! A [`RequestHandle`] stands for one fetch of one URL. It starts out pending
//! and settles exactly once, to an entity or to an error. Any number of
//! callers can wait on a clone of the handle; they all observe the same
//! outcome. This is the unit of request deduplication.

use crate::entity::Entity;
use crate::error::{Result, SirenError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Observable state of a request handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Resolved,
    Rejected,
}

#[derive(Debug, Clone)]
enum Settlement {
    Pending,
    Resolved(Entity),
    Rejected(SirenError),
}

/// Settle-once handle for an in-flight or completed fetch.
#[derive(Clone)]
pub struct RequestHandle {
    url: Arc<str>,
    sender: Arc<watch::Sender<Settlement>>,
}

impl RequestHandle {
    /// A new, pending handle for `url`.
    pub fn pending(url: &str) -> Self {
        let (sender, _) = watch::channel(Settlement::Pending);
        Self {
            url: Arc::from(url),
            sender: Arc::new(sender),
        }
    }

    /// A handle that is already resolved with `entity`.
    pub fn resolved(url: &str, entity: Entity) -> Self {
        let handle = Self::pending(url);
        handle.resolve(entity);
        handle
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> RequestStatus {
        match &*self.sender.borrow() {
            Settlement::Pending => RequestStatus::Pending,
            Settlement::Resolved(_) => RequestStatus::Resolved,
            Settlement::Rejected(_) => RequestStatus::Rejected,
        }
    }

    /// The outcome, if the handle has settled.
    pub fn outcome(&self) -> Option<Result<Entity>> {
        Self::to_outcome(&self.sender.borrow())
    }

    /// Settles the handle with an entity. Returns `false` if it had already
    /// settled, in which case nothing changes.
    pub fn resolve(&self, entity: Entity) -> bool {
        self.settle(Settlement::Resolved(entity))
    }

    /// Settles the handle with an error. Returns `false` if it had already
    /// settled.
    pub fn reject(&self, error: SirenError) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    fn settle(&self, outcome: Settlement) -> bool {
        self.sender.send_if_modified(|current| {
            if matches!(current, Settlement::Pending) {
                *current = outcome;
                true
            } else {
                false
            }
        })
    }

    /// Waits until the handle settles and returns its outcome.
    pub async fn settled(&self) -> Result<Entity> {
        let mut receiver = self.sender.subscribe();
        let settlement = {
            let current = receiver
                .wait_for(|s| !matches!(s, Settlement::Pending))
                .await
                .map_err(|_| SirenError::Abandoned(self.url.to_string()))?;
            (*current).clone()
        };
        Self::to_outcome(&settlement)
            .unwrap_or_else(|| Err(SirenError::Abandoned(self.url.to_string())))
    }

    fn to_outcome(settlement: &Settlement) -> Option<Result<Entity>> {
        match settlement {
            Settlement::Pending => None,
            Settlement::Resolved(entity) => Some(Ok(entity.clone())),
            Settlement::Rejected(error) => Some(Err(error.clone())),
        }
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("url", &self.url)
            .field("status", &self.status())
            .finish()
    }
}

/// Rejects its handle with [`SirenError::Abandoned`] if dropped while the
/// handle is still pending, so joined waiters never hang on a fetch whose
/// driving future was dropped.
pub(crate) struct SettleGuard {
    handle: RequestHandle,
}

impl SettleGuard {
    pub(crate) fn new(handle: RequestHandle) -> Self {
        Self { handle }
    }

    pub(crate) fn resolve(&self, entity: Entity) {
        self.handle.resolve(entity);
    }

    pub(crate) fn reject(&self, error: SirenError) {
        self.handle.reject(error);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.handle.status() == RequestStatus::Pending {
            warn!(url = %self.handle.url(), "Request abandoned before settling");
            self.handle.reject(SirenError::Abandoned(self.handle.url().to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::parser;
    use crate::model::SirenPayload;
    use crate::store::Store;

    fn entity(url: &str) -> Entity {
        parser::parse(
            SirenPayload {
                href: Some(url.into()),
                properties: Some(Default::default()),
                ..SirenPayload::default()
            },
            &Store::detached(),
        )
    }

    #[tokio::test]
    async fn test_settles_exactly_once() {
        let handle = RequestHandle::pending("/a");
        assert_eq!(handle.status(), RequestStatus::Pending);
        assert!(handle.outcome().is_none());

        assert!(handle.resolve(entity("/a")));
        assert!(!handle.reject(SirenError::Abandoned("/a".into())));
        assert_eq!(handle.status(), RequestStatus::Resolved);
        assert_eq!(handle.settled().await.unwrap().url(), "/a");
    }

    #[tokio::test]
    async fn test_waiters_observe_the_same_outcome() {
        let handle = RequestHandle::pending("/a");
        let first = tokio::spawn({
            let handle = handle.clone();
            async move { handle.settled().await }
        });
        let second = tokio::spawn({
            let handle = handle.clone();
            async move { handle.settled().await }
        });

        tokio::task::yield_now().await;
        let settled = entity("/a");
        handle.resolve(settled.clone());

        assert!(first.await.unwrap().unwrap().ptr_eq(&settled));
        assert!(second.await.unwrap().unwrap().ptr_eq(&settled));
    }

    #[tokio::test]
    async fn test_dropped_guard_rejects() {
        let handle = RequestHandle::pending("/a");
        drop(SettleGuard::new(handle.clone()));
        assert_eq!(handle.status(), RequestStatus::Rejected);
        assert!(matches!(handle.settled().await, Err(SirenError::Abandoned(_))));
    }
}
