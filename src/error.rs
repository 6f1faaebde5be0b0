//! # Resolution Errors
//!
//! Every failure the crate surfaces to callers is a [`SirenError`]. The enum is
//! `Clone` because a single failed fetch is observed by every caller that joined
//! the same in-flight request.

use crate::entity::Entity;
use crate::transport::TransportFailure;
use thiserror::Error;

/// Errors produced while resolving entities or executing actions.
#[derive(Debug, Clone, Error)]
pub enum SirenError {
    /// A chain segment names a sub-entity that the current entity does not have.
    #[error("the entity you are looking for, \"{name}\", is not a sub-entity at {url}")]
    MissingSubEntity { name: String, url: String },

    /// The transport rejected the request. `entity` is the failure body parsed
    /// as a hypermedia payload (empty when the body was not parseable).
    #[error("request to {url} failed: {failure}")]
    Transport {
        url: String,
        entity: Entity,
        failure: TransportFailure,
    },

    /// A successful response whose body is not a Siren object.
    #[error("invalid siren payload: {0}")]
    Payload(String),

    /// No action with the requested name is declared on the entity.
    #[error("action not found: {0}")]
    ActionNotFound(String),

    /// The transport rejected an action request.
    #[error("action \"{action}\" failed: {failure}")]
    Action {
        action: String,
        failure: TransportFailure,
    },

    /// The task driving a fetch went away before settling its request handle.
    #[error("request for {0} was abandoned before it settled")]
    Abandoned(String),
}

impl SirenError {
    /// The hypermedia error entity carried by a transport failure, if any.
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            SirenError::Transport { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// The raw transport failure behind this error, if any.
    pub fn failure(&self) -> Option<&TransportFailure> {
        match self {
            SirenError::Transport { failure, .. } | SirenError::Action { failure, .. } => {
                Some(failure)
            }
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SirenError>;
