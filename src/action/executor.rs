//! Action execution.
//!
//! [`plan`] is pure: it turns an entity and one of its actions into the
//! request that would be sent. [`execute`] sends it and applies the outcome to
//! the owning entity.

use super::Action;
use crate::entity::{Entity, EntityEvent};
use crate::error::{Result, SirenError};
use crate::model::SirenPayload;
use crate::store::Store;
use crate::transport::{Request, Transport};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Caller-side knobs for one action run.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Values merged over the serialized entity.
    pub attributes: Map<String, Value>,
    /// Re-register the updated entity here on success.
    pub store: Option<Store>,
    pub headers: Vec<(String, String)>,
}

impl ExecuteOptions {
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The request an action run would send.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub url: String,
    pub method: String,
    pub content_type: String,
    pub body: Value,
}

impl ActionRequest {
    fn into_request(self, headers: Vec<(String, String)>) -> Request {
        Request {
            method: self.method,
            url: self.url,
            content_type: Some(self.content_type),
            headers,
            body: Some(self.body),
        }
    }
}

/// Builds the request for `action` against the current state of `entity`.
///
/// Model bodies are the entity serialized through the action's fields with
/// `overrides` merged on top. Collection bodies are one row per member, each
/// serialized through the same action fields and carrying the member's `id`
/// and the overrides.
pub fn plan(entity: &Entity, action: &Action, overrides: &Map<String, Value>) -> ActionRequest {
    let mut body = entity.serialize(action.name.as_deref(), Some(action.fields.clone()));
    match &mut body {
        Value::Object(map) => merge(map, overrides),
        Value::Array(rows) => {
            for row in rows.iter_mut() {
                if let Value::Object(map) = row {
                    merge(map, overrides);
                }
            }
        }
        _ => {}
    }

    ActionRequest {
        url: action.href.clone(),
        method: action.method.clone(),
        content_type: action.content_type.clone(),
        body,
    }
}

fn merge(target: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (name, value) in overrides {
        target.insert(name.clone(), value.clone());
    }
}

/// Runs `action` against its owning entity. `None` when the action has no
/// owner.
///
/// On success the response payload (if it is a Siren object) replaces the
/// owner's data in place and the owner is returned. On failure the owner is
/// left untouched.
pub async fn execute(
    action: &Action,
    transport: &dyn Transport,
    options: ExecuteOptions,
) -> Option<Result<Entity>> {
    let entity = action.parent()?;
    let label = action.name.clone().unwrap_or_else(|| action.href.clone());
    let ExecuteOptions {
        attributes,
        store,
        headers,
    } = options;

    let planned = plan(&entity, action, &attributes);
    debug!(action = %label, method = %planned.method, url = %planned.url, body = %planned.body, "Executing action");
    entity.emit(EntityEvent::Request {
        action: label.clone(),
    });

    let outcome = match transport.fetch(planned.into_request(headers)).await {
        Ok(body) => {
            if body.is_object() {
                match SirenPayload::from_value(body) {
                    Ok(payload) => {
                        let nested = store.clone().unwrap_or_else(Store::detached);
                        entity.replace(payload, &nested);
                    }
                    Err(e) => warn!(action = %label, error = %e, "Ignoring undecodable action response"),
                }
            }
            if let Some(store) = &store {
                store.add(&entity);
            }
            info!(action = %label, url = %entity.url(), "Action synced");
            entity.emit(EntityEvent::Synced { action: label });
            Ok(entity)
        }
        Err(failure) => {
            warn!(action = %label, %failure, "Action failed");
            entity.emit(EntityEvent::Failed {
                action: label.clone(),
                failure: failure.clone(),
            });
            Err(SirenError::Action {
                action: label,
                failure,
            })
        }
    };
    Some(outcome)
}
